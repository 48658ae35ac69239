//! Port for persisting the debate transcript.
//!
//! The engine hands each artifact to the writer as soon as it exists, so
//! a partially failed run still leaves an audit trail behind.

use mars_domain::{AttributionReport, CostReport, DebateRound};
use thiserror::Error;

/// Errors raised while persisting the transcript
#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl TranscriptError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        TranscriptError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Sink for every artifact a debate produces.
///
/// Writes are synchronous: each artifact is small and written once.
pub trait TranscriptWriter: Send + Sync {
    fn write_prompt(&self, prompt: &str, context: &[String]) -> Result<(), TranscriptError>;

    /// Persist one round's responses (and critiques, if any)
    fn write_round(&self, round: &DebateRound) -> Result<(), TranscriptError>;

    fn write_convergence(&self, reason: &str) -> Result<(), TranscriptError>;

    fn write_resolution(&self, resolution: &str) -> Result<(), TranscriptError>;

    fn write_final(&self, answer: &str) -> Result<(), TranscriptError>;

    /// Persist the attribution summary and round diffs
    fn write_attribution(&self, report: &AttributionReport) -> Result<(), TranscriptError>;

    fn write_costs(&self, report: &CostReport) -> Result<(), TranscriptError>;
}

/// No-op writer for tests and `--json`-only runs
pub struct NoTranscript;

impl TranscriptWriter for NoTranscript {
    fn write_prompt(&self, _prompt: &str, _context: &[String]) -> Result<(), TranscriptError> {
        Ok(())
    }

    fn write_round(&self, _round: &DebateRound) -> Result<(), TranscriptError> {
        Ok(())
    }

    fn write_convergence(&self, _reason: &str) -> Result<(), TranscriptError> {
        Ok(())
    }

    fn write_resolution(&self, _resolution: &str) -> Result<(), TranscriptError> {
        Ok(())
    }

    fn write_final(&self, _answer: &str) -> Result<(), TranscriptError> {
        Ok(())
    }

    fn write_attribution(&self, _report: &AttributionReport) -> Result<(), TranscriptError> {
        Ok(())
    }

    fn write_costs(&self, _report: &CostReport) -> Result<(), TranscriptError> {
        Ok(())
    }
}
