//! Debate domain
//!
//! The data model a debate run produces: rounds of participant responses,
//! critiques, and the final synthesized answer.

pub mod config;
pub mod entities;
pub mod final_answer;
pub mod mode;

pub use config::{
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ROUNDS, DEFAULT_MAX_TOKENS, DebateConfig,
    DebateConfigBuilder,
};
pub use entities::{Critique, DebateResult, DebateRound, LlmResponse, TokenUsage};
pub use final_answer::{FINAL_ANSWER_HEADING, FinalAnswer};
pub use mode::{DebateMode, DebatePhase, Verbosity};
