//! Run Debate use case
//!
//! Wires participants to the strategy selected by the debate mode, runs
//! it, then analyzes the transcript for attribution and cost.

use super::retry::RetryPolicy;
use super::strategy::{
    DebateStrategy, JudgeStrategy, Participant, RoundRobinStrategy, StrategyContext,
};
use crate::ports::llm_provider::ProviderError;
use crate::ports::progress::{DebateProgressNotifier, NoProgress};
use crate::ports::transcript::{NoTranscript, TranscriptError, TranscriptWriter};
use mars_domain::{
    AttributionAnalyzer, AttributionReport, CostReport, DebateConfig, DebateMode, DebateResult,
    DomainError, PricingTable, compute_costs,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Errors that abort a debate run
#[derive(Error, Debug)]
pub enum RunDebateError {
    #[error(transparent)]
    Config(#[from] DomainError),

    #[error("No provider configured for participant '{0}'")]
    UnknownParticipant(String),

    #[error(
        "All participants failed in round {round}. Check model names and provider configuration."
    )]
    AllParticipantsFailed { round: u32 },

    #[error("Judge '{participant}' failed: {source}")]
    JudgeFailed {
        participant: String,
        #[source]
        source: ProviderError,
    },

    #[error("All participants failed during synthesis. Last error: {last_error}")]
    SynthesisFailed { last_error: String },

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// Complete output of a debate run
#[derive(Debug, Clone, Serialize)]
pub struct DebateOutcome {
    pub result: DebateResult,
    pub attribution: AttributionReport,
    pub costs: CostReport,
}

/// Use case for running a debate
pub struct RunDebateUseCase {
    participants: Vec<Participant>,
    retry: RetryPolicy,
    pricing: PricingTable,
    analyzer: AttributionAnalyzer,
}

impl RunDebateUseCase {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self {
            participants,
            retry: RetryPolicy::default(),
            pricing: PricingTable::default(),
            analyzer: AttributionAnalyzer::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn with_analyzer(mut self, analyzer: AttributionAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Execute the use case with default (no-op) progress and transcript
    pub async fn execute(&self, config: &DebateConfig) -> Result<DebateOutcome, RunDebateError> {
        self.execute_with(config, &NoProgress, &NoTranscript).await
    }

    /// Execute the use case with progress callbacks and a transcript sink
    pub async fn execute_with(
        &self,
        config: &DebateConfig,
        progress: &dyn DebateProgressNotifier,
        transcript: &dyn TranscriptWriter,
    ) -> Result<DebateOutcome, RunDebateError> {
        let participants = self.resolve_participants(config)?;

        info!(
            mode = %config.mode(),
            participants = participants.len(),
            max_rounds = config.max_rounds(),
            "Starting debate"
        );

        let ctx = StrategyContext {
            config,
            participants: &participants,
            progress,
            transcript,
            retry: self.retry,
        };
        let strategy: &dyn DebateStrategy = match config.mode() {
            DebateMode::RoundRobin => &RoundRobinStrategy,
            DebateMode::Judge => &JudgeStrategy,
        };
        let result = strategy.run(&ctx).await?;

        let attribution = self.analyzer.analyze(&result);
        let costs = compute_costs(&result, &self.pricing);
        transcript.write_attribution(&attribution)?;
        transcript.write_costs(&costs)?;

        info!(
            rounds = result.rounds.len(),
            total_cost = costs.total_cost,
            "Debate complete"
        );

        Ok(DebateOutcome {
            result,
            attribution,
            costs,
        })
    }

    /// Participants in configuration order. Every configured id must have
    /// a provider before any request is sent.
    fn resolve_participants(
        &self,
        config: &DebateConfig,
    ) -> Result<Vec<Participant>, RunDebateError> {
        config
            .participants()
            .iter()
            .map(|id| {
                self.participants
                    .iter()
                    .find(|p| &p.id == id)
                    .cloned()
                    .ok_or_else(|| RunDebateError::UnknownParticipant(id.clone()))
            })
            .collect()
    }
}
