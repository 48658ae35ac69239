//! Ollama adapter (local models over `/api/chat`)

use super::http::{build_client, read_json, send};
use super::sse::spawn_event_stream;
use super::{ProviderSettings, UsageSlot};
use async_trait::async_trait;
use mars_application::{
    Generation, GenerationRequest, LlmProvider, ProviderError, StreamHandle,
};
use mars_domain::{StreamEvent, TokenUsage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CHAT_PATH: &str = "/api/chat";

pub struct OllamaProvider {
    client: Client,
    settings: ProviderSettings,
    last_usage: UsageSlot,
}

impl OllamaProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            settings,
            last_usage: UsageSlot::default(),
        })
    }

    fn post(&self, body: &ChatRequest<'_>) -> reqwest::RequestBuilder {
        self.client
            .post(self.settings.endpoint(CHAT_PATH))
            .json(body)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct Options {
    num_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Both the complete response and each NDJSON stream line
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

impl ChatResponse {
    fn usage(&self) -> TokenUsage {
        TokenUsage::new(self.prompt_eval_count, self.eval_count)
    }
}

fn chat_request<'a>(
    request: &'a GenerationRequest,
    default_model: &'a str,
    stream: bool,
) -> ChatRequest<'a> {
    ChatRequest {
        model: request.model.as_deref().unwrap_or(default_model),
        messages: request
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        stream,
        options: Options {
            num_predict: request.max_tokens,
            temperature: request.temperature,
        },
    }
}

fn parse_response(response: ChatResponse) -> Result<Generation, ProviderError> {
    if let Some(error) = response.error {
        return Err(ProviderError::Other(error));
    }
    let usage = response.usage();
    let message = response
        .message
        .ok_or_else(|| ProviderError::InvalidResponse("response has no message".to_string()))?;
    Ok(Generation::new(message.content, usage))
}

/// Parse one NDJSON line of a streamed chat
pub(crate) fn parse_stream_line(line: &str) -> Vec<StreamEvent> {
    if line.trim().is_empty() {
        return Vec::new();
    }
    let chunk: ChatResponse = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "Skipping unparseable Ollama stream line");
            return Vec::new();
        }
    };
    if let Some(error) = chunk.error {
        return vec![StreamEvent::Error(error)];
    }

    let mut events = Vec::new();
    if let Some(message) = &chunk.message
        && !message.content.is_empty()
    {
        events.push(StreamEvent::Delta(message.content.clone()));
    }
    if chunk.done {
        events.push(StreamEvent::Usage(chunk.usage()));
        events.push(StreamEvent::Done);
    }
    events
}

// ============================================================================
// Provider Implementation
// ============================================================================

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.settings.default_model
    }

    fn last_usage(&self) -> TokenUsage {
        self.last_usage.get()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ProviderError> {
        let body = chat_request(request, &self.settings.default_model, false);
        let response = send(self.post(&body)).await?;
        let generation = parse_response(read_json(response).await?)?;
        self.last_usage.set(generation.usage);
        Ok(generation)
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<StreamHandle, ProviderError> {
        let body = chat_request(request, &self.settings.default_model, true);
        let response = send(self.post(&body)).await?;
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
    fn test_request_body() {
        let request = GenerationRequest::new(vec![Message::user("hi")], 256);
        let body = serde_json::to_value(chat_request(&request, "llama3.2", false)).unwrap();

        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 256);
        assert!(body["options"].get("temperature").is_none());
    }

    #[test]
    fn test_parse_response() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"model":"llama3.2","message":{"role":"assistant","content":"Hello"},"done":true,"prompt_eval_count":26,"eval_count":8}"#,
        )
        .unwrap();
        let generation = parse_response(response).unwrap();
        assert_eq!(generation.content, "Hello");
        assert_eq!(generation.usage, TokenUsage::new(26, 8));
    }

    #[test]
    fn test_parse_stream_lines() {
        assert_eq!(
            parse_stream_line(r#"{"message":{"role":"assistant","content":"Hel"},"done":false}"#),
            vec![StreamEvent::Delta("Hel".to_string())]
        );
        assert_eq!(
            parse_stream_line(
                r#"{"message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":10,"eval_count":3}"#
            ),
            vec![
                StreamEvent::Usage(TokenUsage::new(10, 3)),
                StreamEvent::Done
            ]
        );
        assert_eq!(
            parse_stream_line(r#"{"error":"model 'x' not found"}"#),
            vec![StreamEvent::Error("model 'x' not found".to_string())]
        );
        assert!(parse_stream_line("").is_empty());
    }
}
