//! Google Gemini adapter (Generative Language API)

use super::http::{build_client, read_json, send};
use super::sse::{spawn_event_stream, sse_data};
use super::{ProviderSettings, UsageSlot};
use async_trait::async_trait;
use mars_application::{
    Generation, GenerationRequest, LlmProvider, ProviderError, StreamHandle,
};
use mars_domain::{Role, StreamEvent, TokenUsage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct GoogleProvider {
    client: Client,
    settings: ProviderSettings,
    last_usage: UsageSlot,
}

impl GoogleProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            settings,
            last_usage: UsageSlot::default(),
        })
    }

    fn post(
        &self,
        model: &str,
        stream: bool,
        body: &GenerateRequest<'_>,
    ) -> reqwest::RequestBuilder {
        let path = if stream {
            format!("/v1beta/models/{model}:streamGenerateContent?alt=sse")
        } else {
            format!("/v1beta/models/{model}:generateContent")
        };
        let request = self.client.post(self.settings.endpoint(&path)).json(body);
        match &self.settings.api_key {
            Some(key) => request.header("x-goog-api-key", key),
            None => request,
        }
    }

    fn model<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        request
            .model
            .as_deref()
            .unwrap_or(&self.settings.default_model)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn usage(&self) -> Option<TokenUsage> {
        self.usage_metadata
            .as_ref()
            .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count))
    }
}

/// Assistant turns use the `model` role; system messages go to
/// `systemInstruction`.
fn generate_request(request: &GenerationRequest) -> GenerateRequest<'_> {
    let mut system = Vec::new();
    let mut contents = Vec::new();
    for message in &request.messages {
        let part = Part {
            text: &message.content,
        };
        match message.role {
            Role::System => system.push(part),
            Role::User => contents.push(Content {
                role: "user",
                parts: vec![part],
            }),
            Role::Assistant => contents.push(Content {
                role: "model",
                parts: vec![part],
            }),
        }
    }

    GenerateRequest {
        contents,
        system_instruction: (!system.is_empty()).then_some(SystemInstruction { parts: system }),
        generation_config: GenerationConfig {
            max_output_tokens: request.max_tokens,
            temperature: request.temperature,
        },
    }
}

fn parse_response(response: GenerateResponse) -> Result<Generation, ProviderError> {
    if response.candidates.is_empty() {
        return Err(ProviderError::InvalidResponse(
            "no candidates in response (prompt may have been blocked)".to_string(),
        ));
    }
    Ok(Generation::new(
        response.text(),
        response.usage().unwrap_or_default(),
    ))
}

/// Parse one SSE line; every chunk is a complete partial response.
pub(crate) fn parse_stream_line(line: &str) -> Vec<StreamEvent> {
    let Some(data) = sse_data(line) else {
        return Vec::new();
    };
    let chunk: GenerateResponse = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "Skipping unparseable Gemini stream chunk");
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    let text = chunk.text();
    if !text.is_empty() {
        events.push(StreamEvent::Delta(text));
    }
    if let Some(usage) = chunk.usage() {
        events.push(StreamEvent::Usage(usage));
    }
    events
}

// ============================================================================
// Provider Implementation
// ============================================================================

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn name(&self) -> &str {
        "google"
    }

    fn default_model(&self) -> &str {
        &self.settings.default_model
    }

    fn last_usage(&self) -> TokenUsage {
        self.last_usage.get()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ProviderError> {
        let body = generate_request(request);
        let response = send(self.post(self.model(request), false, &body)).await?;
        let generation = parse_response(read_json(response).await?)?;
        self.last_usage.set(generation.usage);
        Ok(generation)
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<StreamHandle, ProviderError> {
        let body = generate_request(request);
        let response = send(self.post(self.model(request), true, &body)).await?;
        self.last_usage.set(TokenUsage::default());
        Ok(spawn_event_stream(
            response,
            self.last_usage.clone(),
            parse_stream_line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mars_domain::Message;

    #[test]
    fn test_request_roles_and_system_instruction() {
        let request = GenerationRequest::new(
            vec![
                Message::system("context"),
                Message::user("question"),
                Message::assistant("answer"),
            ],
            512,
        )
        .with_temperature(Some(0.25));
        let body = serde_json::to_value(generate_request(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "context");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(body["generationConfig"]["temperature"], 0.25);
    }

    #[test]
    fn test_parse_response() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Paris"}, {"text": "."}]}, "finishReason": "STOP"}],
                "usageMetadata": {"promptTokenCount": 9, "candidatesTokenCount": 2, "totalTokenCount": 11}
            }"#,
        )
        .unwrap();
        let generation = parse_response(response).unwrap();
        assert_eq!(generation.content, "Paris.");
        assert_eq!(generation.usage, TokenUsage::new(9, 2));
    }

    #[test]
    fn test_blocked_prompt_is_invalid_response() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap();
        assert!(matches!(
            parse_response(response),
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_stream_line() {
        let events = parse_stream_line(
            r#"data: {"candidates":[{"content":{"parts":[{"text":"Hel"}]}}],"usageMetadata":{"promptTokenCount":4,"candidatesTokenCount":1}}"#,
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hel".to_string()),
                StreamEvent::Usage(TokenUsage::new(4, 1)),
            ]
        );
        assert!(parse_stream_line("").is_empty());
    }
}
