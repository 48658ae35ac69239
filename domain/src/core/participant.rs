//! Participant identifiers
//!
//! A participant id is either a bare provider name (`openai`) or a
//! provider name qualified with a model (`openai:gpt-4.1`). The full
//! string identifies the participant throughout a debate; the part before
//! the first `:` selects the provider implementation.

/// Separator between provider name and model in a participant id
pub const MODEL_SEPARATOR: char = ':';

/// Extract the base provider name from a participant id.
///
/// ```
/// use mars_domain::core::participant::provider_base_name;
///
/// assert_eq!(provider_base_name("vertex:claude-sonnet-4"), "vertex");
/// assert_eq!(provider_base_name("openai"), "openai");
/// ```
pub fn provider_base_name(participant_id: &str) -> &str {
    participant_id
        .split_once(MODEL_SEPARATOR)
        .map_or(participant_id, |(base, _)| base)
}

/// Extract the model qualifier from a participant id, if present.
pub fn participant_model(participant_id: &str) -> Option<&str> {
    participant_id
        .split_once(MODEL_SEPARATOR)
        .map(|(_, model)| model)
        .filter(|model| !model.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_of_qualified_id() {
        assert_eq!(provider_base_name("openai:gpt-4.1"), "openai");
    }

    #[test]
    fn base_name_keeps_only_first_segment() {
        assert_eq!(provider_base_name("ollama:llama3.2:8b"), "ollama");
        assert_eq!(participant_model("ollama:llama3.2:8b"), Some("llama3.2:8b"));
    }

    #[test]
    fn bare_id_has_no_model() {
        assert_eq!(participant_model("anthropic"), None);
        assert_eq!(participant_model("anthropic:"), None);
    }
}
