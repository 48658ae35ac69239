//! Application layer for mars
//!
//! This crate contains the debate engine, its strategies, and the port
//! definitions adapters implement. It depends only on the domain layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    llm_provider::{Generation, GenerationRequest, LlmProvider, ProviderError, StreamHandle},
    progress::{DebateProgressNotifier, NoProgress},
    transcript::{NoTranscript, TranscriptError, TranscriptWriter},
};
pub use use_cases::retry::{RetryPolicy, retry_with_backoff};
pub use use_cases::run_debate::{DebateOutcome, RunDebateError, RunDebateUseCase};
pub use use_cases::strategy::{
    DebateStrategy, JudgeStrategy, Participant, RoundRobinStrategy, StrategyContext,
    synthesis_order,
};
