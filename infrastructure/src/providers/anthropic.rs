//! Anthropic Messages API adapter

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

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
    last_usage: UsageSlot,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings.timeout)?,
            settings,
            last_usage: UsageSlot::default(),
        })
    }

    fn post(&self, body: &MessagesRequest<'_>) -> reqwest::RequestBuilder {
        let request = self
            .client
            .post(self.settings.endpoint(MESSAGES_PATH))
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(body);
        match &self.settings.api_key {
            Some(key) => request.header("x-api-key", key),
            None => request,
        }
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Deserialize)]
struct StreamEventPayload {
    #[serde(rename = "type")]
    event_type: String,
    message: Option<StreamMessage>,
    delta: Option<StreamDelta>,
    usage: Option<Usage>,
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamMessage {
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct StreamDelta {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}

/// System messages become the top-level `system` field.
fn messages_request<'a>(
    request: &'a GenerationRequest,
    default_model: &'a str,
    stream: bool,
) -> MessagesRequest<'a> {
    let (system, conversation): (Vec<&Message>, Vec<&Message>) =
        request.messages.iter().partition(|m| m.is_system());
    let system = (!system.is_empty()).then(|| {
        system
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    });

    MessagesRequest {
        model: request.model.as_deref().unwrap_or(default_model),
        max_tokens: request.max_tokens,
        messages: conversation
            .into_iter()
            .map(|m| AnthropicMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect(),
        system,
        temperature: request.temperature,
        stream,
    }
}

fn parse_response(response: MessagesResponse) -> Generation {
    let content = response
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect::<String>();
    let usage = response.usage.unwrap_or_default();
    Generation::new(
        content,
        TokenUsage::new(usage.input_tokens, usage.output_tokens),
    )
}

/// Stateful parser for the Messages SSE stream.
///
/// Input tokens arrive with `message_start`, output tokens with
/// `message_delta`; usage is emitted once both are known.
#[derive(Debug, Default)]
pub(crate) struct StreamParser {
    input_tokens: u64,
}

impl StreamParser {
    pub(crate) fn parse_line(&mut self, line: &str) -> Vec<StreamEvent> {
        let Some(data) = sse_data(line) else {
            return Vec::new();
        };
        let event: StreamEventPayload = match serde_json::from_str(data) {
            Ok(event) => event,
            Err(e) => {
                debug!(error = %e, "Skipping unparseable Anthropic stream event");
                return Vec::new();
            }
        };

        match event.event_type.as_str() {
            "message_start" => {
                if let Some(usage) = event.message.and_then(|m| m.usage) {
                    self.input_tokens = usage.input_tokens;
                }
                Vec::new()
            }
            "content_block_delta" => event
                .delta
                .filter(|d| d.delta_type.as_deref() == Some("text_delta"))
                .and_then(|d| d.text)
                .map(|text| vec![StreamEvent::Delta(text)])
                .unwrap_or_default(),
            "message_delta" => event
                .usage
                .map(|usage| {
                    vec![StreamEvent::Usage(TokenUsage::new(
                        self.input_tokens,
                        usage.output_tokens,
                    ))]
                })
                .unwrap_or_default(),
            "message_stop" => vec![StreamEvent::Done],
            "error" => {
                let message = event
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "unknown stream error".to_string());
                vec![StreamEvent::Error(message)]
            }
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Provider Implementation
// ============================================================================

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        &self.settings.default_model
    }

    fn last_usage(&self) -> TokenUsage {
        self.last_usage.get()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ProviderError> {
        let body = messages_request(request, &self.settings.default_model, false);
        let response = send(self.post(&body)).await?;
        let generation = parse_response(read_json(response).await?);
        self.last_usage.set(generation.usage);
        Ok(generation)
    }

    async fn stream(&self, request: &GenerationRequest) -> Result<StreamHandle, ProviderError> {
        let body = messages_request(request, &self.settings.default_model, true);
        let response = send(self.post(&body)).await?;
        self.last_usage.set(TokenUsage::default());
        let mut parser = StreamParser::default();
        Ok(spawn_event_stream(
            response,
            self.last_usage.clone(),
            move |line| parser.parse_line(line),
        ))
    }
}
