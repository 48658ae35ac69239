//! Debate configuration from TOML (`[debate]` section)

use mars_domain::debate::{
    DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ROUNDS, DEFAULT_MAX_TOKENS,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Participants used when none are given on the command line
const FALLBACK_PROVIDERS: &[&str] = &["openai", "anthropic"];

/// Raw debate configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDebateConfig {
    /// Participants when `-p` is not given.
    ///
    /// Accepts a TOML array or a comma-separated string, so
    /// `MARS_DEBATE__DEFAULT_PROVIDERS=openai,google` works as well.
    #[serde(deserialize_with = "provider_list")]
    pub default_providers: Vec<String>,
    /// Round cap for round-robin debates
    pub max_rounds: u32,
    /// Sentence-similarity ratio above which a debate has converged
    pub convergence_threshold: f64,
    /// Max tokens per response
    pub max_tokens: u32,
    /// Directory that receives one sub-directory per debate
    pub output_dir: PathBuf,
}

impl Default for FileDebateConfig {
    fn default() -> Self {
        Self {
            default_providers: Vec::new(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_tokens: DEFAULT_MAX_TOKENS,
            output_dir: PathBuf::from("./mars-output"),
        }
    }
}

impl FileDebateConfig {
    /// Configured default participants, or `openai` + `anthropic`
    pub fn participants(&self) -> Vec<String> {
        if self.default_providers.is_empty() {
            FALLBACK_PROVIDERS.iter().map(|p| p.to_string()).collect()
        } else {
            self.default_providers.clone()
        }
    }
}

fn provider_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Csv(String),
    }

    let names = match Raw::deserialize(deserializer)? {
        Raw::List(list) => list,
        Raw::Csv(csv) => csv.split(',').map(str::to_string).collect(),
    };
    Ok(names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect())
}
