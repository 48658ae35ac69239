//! OpenAI Chat Completions adapter

use super::http::{build_client, read_json, send};
use super::sse::{spawn_event_stream, sse_data};
use super::{ProviderSettings, UsageSlot};
use async_trait::async_trait;
use mars_application::{
    Generation, GenerationRequest, LlmProvider, ProviderError, StreamHandle,
};
use mars_domain::{Message, StreamEvent, TokenUsage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub struct OpenAiProvider {
    client: Client,
    settings: ProviderSettings,
    last_usage: UsageSlot,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            settings,
            last_usage: UsageSlot::default(),
        })
    }

    fn post(&self, body: &ChatRequest<'_>) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(self.settings.endpoint(CHAT_COMPLETIONS_PATH))
            .json(body);
        match &self.settings.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct StreamOptions {
    include_usage: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl From<Usage> for TokenUsage {
    fn from(usage: Usage) -> Self {
        TokenUsage::new(usage.prompt_tokens, usage.completion_tokens)
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
            .map(|m: &Message| ChatMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        max_completion_tokens: request.max_tokens,
        temperature: request.temperature,
        stream,
        stream_options: stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

fn parse_response(response: ChatResponse) -> Result<Generation, ProviderError> {
    let usage = response.usage.map(TokenUsage::from).unwrap_or_default();
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".to_string()))?;
    Ok(Generation::new(
        choice.message.content.unwrap_or_default(),
        usage,
    ))
}

/// Parse one SSE line of a streamed chat completion
pub(crate) fn parse_stream_line(line: &str) -> Vec<StreamEvent> {
    let Some(data) = sse_data(line) else {
        return Vec::new();
    };
    if data.trim() == "[DONE]" {
        return vec![StreamEvent::Done];
    }

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "Skipping unparseable OpenAI stream chunk");
            return Vec::new();
        }
    };

    let mut events: Vec<StreamEvent> = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.and_then(|d| d.content))
        .filter(|content| !content.is_empty())
        .map(StreamEvent::Delta)
        .collect();
    if let Some(usage) = chunk.usage {
        events.push(StreamEvent::Usage(usage.into()));
    }
    events
}

// ============================================================================
// Provider Implementation
// ============================================================================

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
