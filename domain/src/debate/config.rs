//! Validated debate configuration.
//!
//! [`DebateConfig`] can only be obtained through [`DebateConfigBuilder::build`],
//! which rejects invalid values before any provider is contacted.

use super::mode::{DebateMode, Verbosity};
use crate::core::error::DomainError;
use std::collections::HashMap;

pub const DEFAULT_MAX_ROUNDS: u32 = 3;
pub const DEFAULT_CONVERGENCE_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Validated input for a debate run
#[derive(Debug, Clone, PartialEq)]
pub struct DebateConfig {
    prompt: String,
    context: Vec<String>,
    participants: Vec<String>,
    model_overrides: HashMap<String, String>,
    mode: DebateMode,
    max_rounds: u32,
    judge: Option<String>,
    synthesis_provider: Option<String>,
    convergence_threshold: f64,
    max_tokens: u32,
    temperature: Option<f32>,
    verbosity: Verbosity,
}

impl DebateConfig {
    /// Start building a configuration for `prompt` debated by `participants`
    pub fn builder(
        prompt: impl Into<String>,
        participants: impl IntoIterator<Item = impl Into<String>>,
    ) -> DebateConfigBuilder {
        DebateConfigBuilder {
            prompt: prompt.into(),
            context: Vec::new(),
            participants: participants.into_iter().map(Into::into).collect(),
            model_overrides: HashMap::new(),
            mode: DebateMode::default(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            judge: None,
            synthesis_provider: None,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            verbosity: Verbosity::default(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn context(&self) -> &[String] {
        &self.context
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn model_overrides(&self) -> &HashMap<String, String> {
        &self.model_overrides
    }

    /// Model override for a participant, if one was configured
    pub fn model_override(&self, participant_id: &str) -> Option<&str> {
        self.model_overrides.get(participant_id).map(String::as_str)
    }

    pub fn mode(&self) -> DebateMode {
        self.mode
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub fn judge(&self) -> Option<&str> {
        self.judge.as_deref()
    }

    pub fn synthesis_provider(&self) -> Option<&str> {
        self.synthesis_provider.as_deref()
    }

    pub fn convergence_threshold(&self) -> f64 {
        self.convergence_threshold
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

/// Builder for [`DebateConfig`]
#[derive(Debug, Clone)]
pub struct DebateConfigBuilder {
    prompt: String,
    context: Vec<String>,
    participants: Vec<String>,
    model_overrides: HashMap<String, String>,
    mode: DebateMode,
    max_rounds: u32,
    judge: Option<String>,
    synthesis_provider: Option<String>,
    convergence_threshold: f64,
    max_tokens: u32,
    temperature: Option<f32>,
    verbosity: Verbosity,
}

impl DebateConfigBuilder {
    pub fn context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    pub fn model_override(
        mut self,
        participant_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        self.model_overrides
            .insert(participant_id.into(), model.into());
        self
    }

    pub fn model_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.model_overrides.extend(overrides);
        self
    }

    pub fn mode(mut self, mode: DebateMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn judge(mut self, judge: Option<String>) -> Self {
        self.judge = judge;
        self
    }

    pub fn synthesis_provider(mut self, provider: Option<String>) -> Self {
        self.synthesis_provider = provider;
        self
    }

    pub fn convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Validate and produce the configuration
    pub fn build(self) -> Result<DebateConfig, DomainError> {
        if self.prompt.trim().is_empty() {
            return Err(DomainError::EmptyPrompt);
        }
        if self.participants.is_empty() {
            return Err(DomainError::NoParticipants);
        }
        for (i, id) in self.participants.iter().enumerate() {
            if id.trim().is_empty() {
                return Err(DomainError::EmptyParticipantId);
            }
            if self.participants[..i].contains(id) {
                return Err(DomainError::DuplicateParticipant(id.clone()));
            }
        }
        if self.max_rounds < 1 {
            return Err(DomainError::InvalidMaxRounds(self.max_rounds));
        }
        if !(0.0..=1.0).contains(&self.convergence_threshold) {
            return Err(DomainError::InvalidThreshold(self.convergence_threshold));
        }
        if self.max_tokens == 0 {
            return Err(DomainError::InvalidMaxTokens);
        }
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(DomainError::InvalidTemperature(t));
        }
        // Lowest key first so the reported override is stable across runs
        if let Some(unknown) = self
            .model_overrides
            .keys()
            .filter(|id| !self.participants.contains(id))
            .min()
        {
            return Err(DomainError::UnknownOverride(unknown.clone()));
        }
        if self.mode == DebateMode::Judge {
            let judge = self.judge.as_deref().ok_or(DomainError::MissingJudge)?;
            if !self.participants.iter().any(|p| p == judge) {
                return Err(DomainError::JudgeNotParticipant {
                    judge: judge.to_string(),
                    available: self.participants.join(", "),
                });
            }
        }

        Ok(DebateConfig {
            prompt: self.prompt,
            context: self.context,
            participants: self.participants,
            model_overrides: self.model_overrides,
            mode: self.mode,
            max_rounds: self.max_rounds,
            judge: self.judge,
            synthesis_provider: self.synthesis_provider,
            convergence_threshold: self.convergence_threshold,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            verbosity: self.verbosity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebateConfig::builder("Is Rust fast?", ["openai", "anthropic"])
            .build()
            .unwrap();
        assert_eq!(config.max_rounds(), 3);
        assert_eq!(config.convergence_threshold(), 0.85);
        assert_eq!(config.max_tokens(), 8192);
        assert_eq!(config.mode(), DebateMode::RoundRobin);
        assert_eq!(config.verbosity(), Verbosity::Quiet);
        assert!(config.temperature().is_none());
    }

    #[test]
    fn test_rejects_empty_participants() {
        let err = DebateConfig::builder("q", Vec::<String>::new())
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::NoParticipants);
    }

    #[test]
    fn test_rejects_duplicate_participants() {
        let err = DebateConfig::builder("q", ["openai", "openai"])
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateParticipant("openai".to_string()));
    }

    #[test]
    fn test_rejects_zero_rounds() {
        let err = DebateConfig::builder("q", ["openai"])
            .max_rounds(0)
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidMaxRounds(0));
    }

    #[test]
    fn test_threshold_range() {
        assert!(
            DebateConfig::builder("q", ["openai"])
                .convergence_threshold(1.0)
                .build()
                .is_ok()
        );
        assert!(
            DebateConfig::builder("q", ["openai"])
                .convergence_threshold(0.0)
                .build()
                .is_ok()
        );
        let err = DebateConfig::builder("q", ["openai"])
            .convergence_threshold(1.2)
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidThreshold(1.2));
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let err = DebateConfig::builder("q", ["openai"])
            .temperature(Some(2.5))
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidTemperature(2.5));
    }

    #[test]
    fn test_judge_mode_requires_judge() {
        let err = DebateConfig::builder("q", ["openai", "anthropic"])
            .mode(DebateMode::Judge)
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::MissingJudge);
    }

    #[test]
    fn test_judge_must_be_participant() {
        let err = DebateConfig::builder("q", ["openai", "anthropic"])
            .mode(DebateMode::Judge)
            .judge(Some("google".to_string()))
            .build()
            .unwrap_err();
        assert!(err.is_judge_error());
        assert!(err.to_string().contains("openai, anthropic"));
    }

    #[test]
    fn test_override_must_target_participant() {
        let err = DebateConfig::builder("q", ["openai"])
            .model_override("anthropic", "claude-opus-4")
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::UnknownOverride("anthropic".to_string()));

        let config = DebateConfig::builder("q", ["openai"])
            .model_override("openai", "gpt-4.1")
            .build()
            .unwrap();
        assert_eq!(config.model_override("openai"), Some("gpt-4.1"));
    }

    #[test]
    fn test_unknown_override_reported_deterministically() {
        for _ in 0..8 {
            let err = DebateConfig::builder("q", ["openai"])
                .model_override("ollama", "llama3")
                .model_override("anthropic", "claude-opus-4")
                .model_override("google", "gemini-2.5-pro")
                .build()
                .unwrap_err();
            assert_eq!(err, DomainError::UnknownOverride("anthropic".to_string()));
        }
    }

    #[test]
    fn test_rejects_zero_max_tokens() {
        let err = DebateConfig::builder("q", ["openai"])
            .max_tokens(0)
            .build()
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidMaxTokens);
    }

    #[test]
    fn test_every_invalid_field_is_rejected_at_build() {
        let invalid = [
            DebateConfig::builder("", ["openai"]),
            DebateConfig::builder("q", ["openai", "openai"]),
            DebateConfig::builder("q", ["openai"]).mode(DebateMode::Judge),
            DebateConfig::builder("q", ["openai"]).max_rounds(0),
            DebateConfig::builder("q", ["openai"]).convergence_threshold(7.5),
            DebateConfig::builder("q", ["openai"]).max_tokens(0),
            DebateConfig::builder("q", ["openai"]).temperature(Some(9.0)),
        ];
        for builder in invalid {
            assert!(builder.build().is_err());
        }
    }

    #[test]
    fn test_rejects_blank_prompt() {
        let err = DebateConfig::builder("   ", ["openai"]).build().unwrap_err();
        assert_eq!(err, DomainError::EmptyPrompt);
    }
}
