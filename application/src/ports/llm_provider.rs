//! LLM provider port
//!
//! Defines the capability every provider adapter offers to the debate
//! engine. The engine only ever talks to `dyn LlmProvider`, so any vendor
//! client (or an in-memory fake) is interchangeable.

use async_trait::async_trait;
use mars_domain::{Message, StreamEvent, TokenUsage};
use thiserror::Error;
use tokio::sync::mpsc;

/// Substrings that mark an otherwise unclassified error as transient
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "ratelimit",
    "rate_limit",
    "rate limit",
    "connection",
    "internalserver",
    "server_error",
    "overloaded",
    "503",
    "529",
];

/// Errors that can occur during provider calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout
            | ProviderError::Connection(_)
            | ProviderError::RateLimited(_)
            | ProviderError::Server { .. } => true,
            ProviderError::Api { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Auth(_)
            | ProviderError::ModelNotFound(_)
            | ProviderError::InvalidResponse(_) => false,
            ProviderError::Stream(message) | ProviderError::Other(message) => {
                let message = message.to_lowercase();
                TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
            }
        }
    }
}

/// A single generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    /// Model to use; `None` selects the provider's default model
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            messages,
            model: None,
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Generated text plus token usage
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub content: String,
    pub usage: TokenUsage,
}

impl Generation {
    pub fn new(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage,
        }
    }
}

/// Handle for receiving streaming events from a provider.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`; the sending side is driven by
/// the adapter's transport task.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the sender is gone
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }
}

/// Text generation capability of one configured provider
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Base provider name (`openai`, `anthropic`, ...)
    fn name(&self) -> &str;

    /// Model used when a request does not name one
    fn default_model(&self) -> &str;

    /// Usage reported by the most recent completed call
    fn last_usage(&self) -> TokenUsage;

    /// Generate a complete response
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ProviderError>;

    /// Generate a response incrementally.
    ///
    /// Default implementation calls `generate()` and replays the result as
    /// a single delta, so adapters without streaming support still work.
    async fn stream(&self, request: &GenerationRequest) -> Result<StreamHandle, ProviderError> {
        let generation = self.generate(request).await?;
        let (tx, rx) = mpsc::channel(3);
        // Capacity covers all three events; a dropped receiver is fine
        let _ = tx.send(StreamEvent::Delta(generation.content)).await;
        let _ = tx.send(StreamEvent::Usage(generation.usage)).await;
        let _ = tx.send(StreamEvent::Done).await;
        Ok(StreamHandle::new(rx))
    }
}
