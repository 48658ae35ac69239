//! Provider registry
//!
//! Resolves provider settings from the `[providers]` config sections and the
//! environment, and builds one adapter instance per debate participant.

use super::{
    AnthropicProvider, GoogleProvider, OllamaProvider, OpenAiProvider, ProviderKind,
    ProviderSettings,
};
use crate::config::{FileProviderConfig, FileProvidersConfig};
use mars_application::{LlmProvider, Participant, ProviderError};
use mars_domain::{participant_model, provider_base_name};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Base names accepted in participant ids
pub const AVAILABLE_PROVIDERS: &[&str] = &["openai", "anthropic", "google", "ollama"];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown provider '{name}'. Available: {}", AVAILABLE_PROVIDERS.join(", "))]
    UnknownProvider { name: String },

    #[error("No API key for {provider}. Set {hint} or providers.{provider}.api_key in mars.toml")]
    MissingApiKey { provider: String, hint: String },

    #[error("Failed to initialize {provider}: {source}")]
    Client {
        provider: String,
        #[source]
        source: ProviderError,
    },
}

/// Configuration state of one provider, for `mars providers`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub name: &'static str,
    pub default_model: String,
    pub configured: bool,
    /// Where the key came from, or the endpoint for keyless providers
    pub detail: String,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builds provider adapters from configuration
pub struct ProviderRegistry {
    config: FileProvidersConfig,
    env: EnvLookup,
}

impl ProviderRegistry {
    pub fn new(config: FileProvidersConfig) -> Self {
        Self::with_env(config, |name| std::env::var(name).ok())
    }

    /// Use a custom environment lookup instead of the process environment
    pub fn with_env(
        config: FileProvidersConfig,
        env: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            env: Box::new(env),
        }
    }

    fn section(&self, kind: ProviderKind) -> &FileProviderConfig {
        match kind {
            ProviderKind::OpenAi => &self.config.openai,
            ProviderKind::Anthropic => &self.config.anthropic,
            ProviderKind::Google => &self.config.google,
            ProviderKind::Ollama => &self.config.ollama,
        }
    }

    /// Find the API key and describe its source.
    ///
    /// Order: inline `api_key`, the variable named by `api_key_env`, then
    /// the built-in variables for the provider.
    fn resolve_api_key(&self, kind: ProviderKind) -> Option<(String, String)> {
        let section = self.section(kind);
        if let Some(key) = section.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some((key.clone(), "config file".to_string()));
        }

        section
            .api_key_env
            .iter()
            .map(String::as_str)
            .chain(kind.key_env_vars().iter().copied())
            .find_map(|var| {
                (self.env)(var)
                    .filter(|value| !value.trim().is_empty())
                    .map(|value| (value.trim().to_string(), format!("${var}")))
            })
    }

    fn key_hint(&self, kind: ProviderKind) -> String {
        self.section(kind)
            .api_key_env
            .iter()
            .map(String::as_str)
            .chain(kind.key_env_vars().iter().copied())
            .next()
            .unwrap_or_default()
            .to_string()
    }

    /// Resolved settings for a provider family
    pub fn settings(&self, kind: ProviderKind) -> Result<ProviderSettings, RegistryError> {
        let section = self.section(kind);
        let mut settings = ProviderSettings::defaults(kind);
        settings.timeout = Duration::from_secs(section.timeout_secs);
        if let Some(base_url) = &section.base_url {
            settings = settings.with_base_url(base_url.as_str());
        }
        if let Some(model) = &section.default_model {
            settings = settings.with_default_model(model.as_str());
        }

        if kind.requires_api_key() {
            let (key, _) = self
                .resolve_api_key(kind)
                .ok_or_else(|| RegistryError::MissingApiKey {
                    provider: kind.to_string(),
                    hint: self.key_hint(kind),
                })?;
            settings = settings.with_api_key(key);
        }
        Ok(settings)
    }

    /// Build an adapter for a participant id (`base` or `base:model`).
    ///
    /// A model qualifier becomes the adapter's default model.
    pub fn create(&self, participant_id: &str) -> Result<Arc<dyn LlmProvider>, RegistryError> {
        let base = provider_base_name(participant_id);
        let kind: ProviderKind = base.parse().map_err(|_| RegistryError::UnknownProvider {
            name: base.to_string(),
        })?;

        let mut settings = self.settings(kind)?;
        if let Some(model) = participant_model(participant_id) {
            settings = settings.with_default_model(model);
        }
        debug!(participant = participant_id, settings = ?settings, "Creating provider");

        let client_error = |source: ProviderError| RegistryError::Client {
            provider: kind.to_string(),
            source,
        };
        let provider: Arc<dyn LlmProvider> = match kind {
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(settings).map_err(client_error)?),
            ProviderKind::Anthropic => {
                Arc::new(AnthropicProvider::new(settings).map_err(client_error)?)
            }
            ProviderKind::Google => Arc::new(GoogleProvider::new(settings).map_err(client_error)?),
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(settings).map_err(client_error)?),
        };
        Ok(provider)
    }

    /// One participant per id, each with its own adapter instance so
    /// per-call usage tracking never crosses participants.
    pub fn build_participants(&self, ids: &[String]) -> Result<Vec<Participant>, RegistryError> {
        ids.iter()
            .map(|id| Ok(Participant::new(id.as_str(), self.create(id)?)))
            .collect()
    }

    /// Configuration state of every built-in provider
    pub fn provider_statuses(&self) -> Vec<ProviderStatus> {
        ProviderKind::ALL
            .into_iter()
            .map(|kind| {
                let section = self.section(kind);
                let default_model = section
                    .default_model
                    .clone()
                    .unwrap_or_else(|| kind.default_model().to_string());

                let (configured, detail) = if kind.requires_api_key() {
                    match self.resolve_api_key(kind) {
                        Some((_, source)) => (true, format!("key from {source}")),
                        None => (false, format!("set {}", self.key_hint(kind))),
                    }
                } else {
                    let base_url = section
                        .base_url
                        .clone()
                        .unwrap_or_else(|| kind.default_base_url().to_string());
                    (true, base_url)
                };

                ProviderStatus {
                    name: kind.as_str(),
                    default_model,
                    configured,
                    detail,
                }
            })
            .collect()
    }
}
