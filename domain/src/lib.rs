//! Domain layer for mars
//!
//! This crate contains the debate data model, configuration validation,
//! prompt templates, and the post-debate analysis engines.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Debate
//!
//! Several participants (LLM providers, optionally pinned to a model) answer
//! the same prompt, then either critique each other round by round until
//! their answers converge (**round-robin**) or hand their answers to a
//! single **judge**. A final synthesis merges everything into one answer.
//!
//! ## Attribution
//!
//! After the debate, sentence-level similarity traces how much of the final
//! answer came from each participant, how much of their opening answer
//! survived, and how often they swayed each other.

pub mod analysis;
pub mod core;
pub mod debate;
pub mod prompt;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use analysis::{
    AttributionAnalyzer, AttributionReport, CostReport, ModelPrice, PricingTable,
    ProviderAttribution, ProviderCost, RoundDiff, compute_costs,
};
pub use core::{
    error::DomainError,
    participant::{participant_model, provider_base_name},
};
pub use debate::{
    Critique, DebateConfig, DebateConfigBuilder, DebateMode, DebatePhase, DebateResult,
    DebateRound, FINAL_ANSWER_HEADING, FinalAnswer, LlmResponse, TokenUsage, Verbosity,
};
pub use prompt::DebatePrompt;
pub use session::{
    entities::{Message, Role},
    stream::StreamEvent,
};
pub use util::{format_thousands, redact_secrets};
