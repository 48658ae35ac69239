//! Infrastructure layer for mars
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: HTTP clients for each LLM vendor, the
//! Markdown transcript writer, and configuration file loading.

pub mod config;
pub mod output;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileConfig, FileDebateConfig, FileProviderConfig,
    FileProvidersConfig, FileRetryConfig,
};
pub use output::{DebateSummary, MarkdownWriter, OutputError};
pub use providers::{
    AVAILABLE_PROVIDERS, AnthropicProvider, GoogleProvider, OllamaProvider, OpenAiProvider,
    ProviderKind, ProviderRegistry, ProviderSettings, ProviderStatus, RegistryError,
};
