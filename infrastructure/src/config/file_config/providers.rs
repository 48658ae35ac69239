//! Provider configuration from TOML (`[providers]` section)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default request timeout for provider HTTP calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for one provider (`[providers.<name>]`).
///
/// Every field is optional; unset values fall back to the provider's
/// built-in defaults when the registry builds the adapter.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Direct API key (not recommended, prefer `api_key_env`)
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    /// Endpoint override (proxies, Azure-style gateways, remote Ollama)
    pub base_url: Option<String>,
    /// Model used when a participant id carries no model
    pub default_model: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: None,
            base_url: None,
            default_model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// Keeps inline keys out of `--log` output
impl fmt::Debug for FileProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("api_key_env", &self.api_key_env)
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// All provider sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileProviderConfig,
    pub anthropic: FileProviderConfig,
    pub google: FileProviderConfig,
    pub ollama: FileProviderConfig,
}

impl FileProvidersConfig {
    /// Section for a base provider name
    pub fn get(&self, name: &str) -> Option<&FileProviderConfig> {
        match name {
            "openai" => Some(&self.openai),
            "anthropic" => Some(&self.anthropic),
            "google" => Some(&self.google),
            "ollama" => Some(&self.ollama),
            _ => None,
        }
    }

    /// Sections paired with their names
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FileProviderConfig)> {
        [
            ("openai", &self.openai),
            ("anthropic", &self.anthropic),
            ("google", &self.google),
            ("ollama", &self.ollama),
        ]
        .into_iter()
    }
}
