//! Debate value objects - the transcript types produced by a strategy.
//!
//! - [`TokenUsage`] - token counts reported by one provider call
//! - [`LlmResponse`] - one participant's output for one call
//! - [`Critique`] - a participant's critique of another (round-robin rounds ≥ 2)
//! - [`DebateRound`] - all responses and critiques of one round
//! - [`DebateResult`] - the complete transcript plus final answer

use super::mode::DebateMode;
use serde::{Deserialize, Serialize};

/// Token counts for one provider call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Output of a single provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Participant id (`provider` or `provider:model`)
    pub participant_id: String,
    /// The model that actually served the request
    pub model: String,
    /// Generated text
    pub content: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

impl LlmResponse {
    pub fn new(
        participant_id: impl Into<String>,
        model: impl Into<String>,
        content: impl Into<String>,
        usage: TokenUsage,
    ) -> Self {
        Self {
            participant_id: participant_id.into(),
            model: model.into(),
            content: content.into(),
            usage,
        }
    }
}

/// A critique written by `author` about `target`'s previous answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critique {
    pub author: String,
    pub target: String,
    pub content: String,
}

impl Critique {
    pub fn new(
        author: impl Into<String>,
        target: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            target: target.into(),
            content: content.into(),
        }
    }
}

/// One synchronized cycle of provider calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateRound {
    pub round_number: u32,
    #[serde(default)]
    pub responses: Vec<LlmResponse>,
    #[serde(default)]
    pub critiques: Vec<Critique>,
}

impl DebateRound {
    pub fn new(round_number: u32, responses: Vec<LlmResponse>) -> Self {
        Self {
            round_number,
            responses,
            critiques: Vec::new(),
        }
    }

    pub fn with_critiques(mut self, critiques: Vec<Critique>) -> Self {
        self.critiques = critiques;
        self
    }

    /// Look up the response of a participant in this round
    pub fn response_of(&self, participant_id: &str) -> Option<&LlmResponse> {
        self.responses
            .iter()
            .find(|r| r.participant_id == participant_id)
    }
}

/// Complete result of a debate run
///
/// Built incrementally by the active strategy and returned once complete.
/// Afterwards it is read-only input to attribution and cost analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateResult {
    pub prompt: String,
    #[serde(default)]
    pub context: Vec<String>,
    pub mode: DebateMode,
    #[serde(default)]
    pub rounds: Vec<DebateRound>,
    #[serde(default)]
    pub final_answer: String,
    #[serde(default)]
    pub convergence_reason: String,
    #[serde(default)]
    pub resolution_reasoning: String,
    /// Response of the participant that synthesized the final answer.
    ///
    /// Kept outside `rounds` so that attribution never credits the
    /// synthesizer with its own output; cost analysis still counts it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<LlmResponse>,
}

impl DebateResult {
    pub fn new(prompt: impl Into<String>, context: Vec<String>, mode: DebateMode) -> Self {
        Self {
            prompt: prompt.into(),
            context,
            mode,
            rounds: Vec::new(),
            final_answer: String::new(),
            convergence_reason: String::new(),
            resolution_reasoning: String::new(),
            synthesis: None,
        }
    }

    /// Append the next round. Round numbers must be strictly increasing.
    pub fn push_round(&mut self, round: DebateRound) {
        debug_assert!(
            self.rounds
                .last()
                .is_none_or(|last| last.round_number < round.round_number),
            "rounds must be appended in increasing order"
        );
        self.rounds.push(round);
    }

    /// Iterate every response of every round, in transcript order
    pub fn all_responses(&self) -> impl Iterator<Item = (u32, &LlmResponse)> {
        self.rounds
            .iter()
            .flat_map(|r| r.responses.iter().map(move |resp| (r.round_number, resp)))
    }

    /// Participant ids in order of first appearance in the transcript
    pub fn participants(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for (_, response) in self.all_responses() {
            if !ids.contains(&response.participant_id) {
                ids.push(response.participant_id.clone());
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(id: &str, content: &str) -> LlmResponse {
        LlmResponse::new(id, "model-x", content, TokenUsage::default())
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage::new(120, 30);
        assert_eq!(usage.total(), 150);
        assert!(!usage.is_empty());
        assert!(TokenUsage::default().is_empty());
    }

    #[test]
    fn test_participants_in_first_appearance_order() {
        let mut result = DebateResult::new("q", vec![], DebateMode::RoundRobin);
        result.push_round(DebateRound::new(
            1,
            vec![response("anthropic", "a"), response("openai", "b")],
        ));
        result.push_round(DebateRound::new(
            2,
            vec![response("openai", "c"), response("google", "d")],
        ));

        assert_eq!(result.participants(), vec!["anthropic", "openai", "google"]);
        assert_eq!(result.all_responses().count(), 4);
    }

    #[test]
    fn test_response_lookup() {
        let round = DebateRound::new(1, vec![response("openai", "hello")]);
        assert_eq!(round.response_of("openai").unwrap().content, "hello");
        assert!(round.response_of("anthropic").is_none());
    }

    #[test]
    fn test_synthesis_not_serialized_when_absent() {
        let result = DebateResult::new("q", vec![], DebateMode::Judge);
        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("synthesis"));
        assert!(json.contains("\"mode\":\"judge\""));
    }
}
