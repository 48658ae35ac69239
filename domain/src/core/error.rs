//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Every variant describes a configuration problem that is detected
/// before any provider is contacted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("At least one participant is required")]
    NoParticipants,

    #[error("Participant '{0}' is listed more than once")]
    DuplicateParticipant(String),

    #[error("Participant id cannot be empty")]
    EmptyParticipantId,

    #[error("max_rounds must be at least 1 (got {0})")]
    InvalidMaxRounds(u32),

    #[error("convergence_threshold must be between 0.0 and 1.0 (got {0})")]
    InvalidThreshold(f64),

    #[error("temperature must be between 0.0 and 2.0 (got {0})")]
    InvalidTemperature(f32),

    #[error("max_tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("Judge mode requires a judge participant")]
    MissingJudge,

    #[error("Judge '{judge}' is not among the selected participants. Available: {available}")]
    JudgeNotParticipant { judge: String, available: String },

    #[error("Model override for '{0}' does not match any participant")]
    UnknownOverride(String),
}

impl DomainError {
    /// Check if this error concerns judge configuration
    pub fn is_judge_error(&self) -> bool {
        matches!(
            self,
            DomainError::MissingJudge | DomainError::JudgeNotParticipant { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_not_participant_display() {
        let error = DomainError::JudgeNotParticipant {
            judge: "google".to_string(),
            available: "openai, anthropic".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Judge 'google' is not among the selected participants. Available: openai, anthropic"
        );
    }

    #[test]
    fn test_is_judge_error_check() {
        assert!(DomainError::MissingJudge.is_judge_error());
        assert!(!DomainError::NoParticipants.is_judge_error());
        assert!(!DomainError::InvalidMaxRounds(0).is_judge_error());
    }
}
