//! LLM provider adapters
//!
//! One adapter per vendor API, each implementing the application layer's
//! [`LlmProvider`](mars_application::LlmProvider) port over plain HTTP.
//! [`ProviderRegistry`](registry::ProviderRegistry) turns participant ids
//! into configured adapter instances.

pub mod anthropic;
pub mod google;
pub mod http;
pub mod ollama;
pub mod openai;
pub mod registry;
pub mod sse;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use registry::{AVAILABLE_PROVIDERS, ProviderRegistry, ProviderStatus, RegistryError};

use mars_domain::TokenUsage;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Built-in provider families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Google,
    Ollama,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Google,
        ProviderKind::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
            ProviderKind::Google => "gemini-2.0-flash",
            ProviderKind::Ollama => "llama3.2",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Google => "https://generativelanguage.googleapis.com",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    /// Environment variables searched for the API key, in order.
    ///
    /// Empty for providers that need no key.
    pub fn key_env_vars(&self) -> &'static [&'static str] {
        match self {
            ProviderKind::OpenAi => &["MARS_OPENAI_API_KEY", "OPENAI_API_KEY"],
            ProviderKind::Anthropic => &["MARS_ANTHROPIC_API_KEY", "ANTHROPIC_API_KEY"],
            ProviderKind::Google => &["MARS_GOOGLE_API_KEY", "GOOGLE_API_KEY", "GEMINI_API_KEY"],
            ProviderKind::Ollama => &[],
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !self.key_env_vars().is_empty()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown provider: {}", s))
    }
}

/// Resolved settings an adapter is built from
#[derive(Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    /// Endpoint root without trailing slash
    pub base_url: String,
    pub default_model: String,
    pub timeout: Duration,
}

impl ProviderSettings {
    /// Built-in defaults for a provider family, without credentials
    pub fn defaults(kind: ProviderKind) -> Self {
        Self {
            api_key: None,
            base_url: kind.default_base_url().to_string(),
            default_model: kind.default_model().to_string(),
            timeout: Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// `base_url` joined with an absolute API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Usage of the most recent call, shared with a streaming task
#[derive(Debug, Clone, Default)]
pub struct UsageSlot(Arc<Mutex<TokenUsage>>);

impl UsageSlot {
    pub fn get(&self) -> TokenUsage {
        self.0.lock().map(|usage| *usage).unwrap_or_default()
    }

    pub fn set(&self, usage: TokenUsage) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = usage;
        }
    }
}
