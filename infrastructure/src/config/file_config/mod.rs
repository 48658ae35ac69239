//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; defaults live in their `Default` impls.

mod debate;
mod providers;
mod retry;

pub use debate::FileDebateConfig;
pub use providers::{DEFAULT_TIMEOUT_SECS, FileProviderConfig, FileProvidersConfig};
pub use retry::FileRetryConfig;

use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Debate defaults
    pub debate: FileDebateConfig,
    /// Retry budget for provider calls
    pub retry: FileRetryConfig,
    /// Per-provider credentials and endpoints
    pub providers: FileProvidersConfig,
}

impl FileConfig {
    /// Validate value ranges, returning a message per problem found.
    ///
    /// Problems are reported here rather than at debate start so that a bad
    /// config file is pointed at directly.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.debate.max_rounds == 0 {
            issues.push("debate.max_rounds must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.debate.convergence_threshold) {
            issues.push(format!(
                "debate.convergence_threshold must be between 0 and 1 (got {})",
                self.debate.convergence_threshold
            ));
        }
        if self.debate.max_tokens == 0 {
            issues.push("debate.max_tokens must be greater than 0".to_string());
        }
        for (name, provider) in self.providers.iter() {
            if provider.timeout_secs == 0 {
                issues.push(format!("providers.{name}.timeout_secs cannot be 0"));
            }
        }

        issues
    }
}
