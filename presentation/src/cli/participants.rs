//! Translation of raw debate flags into debate configuration inputs
//!
//! - `@path` values for the prompt and context are read from files
//! - `--model provider:model` overrides fan out to every participant of
//!   that provider

use mars_domain::provider_base_name;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArgumentError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown provider '{name}'. Available: {available}")]
    UnknownProvider { name: String, available: String },

    #[error("Invalid --model format '{0}'. Expected provider:model.")]
    InvalidModelOverride(String),

    #[error("--model {provider}:{model} does not match any participant")]
    UnmatchedModelOverride { provider: String, model: String },
}

/// Return the value as-is, or the trimmed content of the file it names
/// when it starts with `@`
pub fn resolve_value(value: &str) -> Result<String, ArgumentError> {
    let Some(path) = value.strip_prefix('@') else {
        return Ok(value.to_string());
    };
    let path = PathBuf::from(path);
    if !path.is_file() {
        return Err(ArgumentError::FileNotFound(path));
    }
    fs::read_to_string(&path)
        .map(|content| content.trim().to_string())
        .map_err(|source| ArgumentError::Read { path, source })
}

/// Participant ids from `-p` flags, falling back to `defaults`.
///
/// Every base provider name must be one of `available`.
pub fn participant_ids(
    flags: &[String],
    defaults: &[String],
    available: &[&str],
) -> Result<Vec<String>, ArgumentError> {
    let ids: Vec<String> = if flags.is_empty() {
        defaults.to_vec()
    } else {
        flags.iter().map(|f| f.trim().to_string()).collect()
    };

    for id in &ids {
        let base = provider_base_name(id);
        if !available.contains(&base) {
            return Err(ArgumentError::UnknownProvider {
                name: base.to_string(),
                available: available.join(", "),
            });
        }
    }
    Ok(ids)
}

/// Map `--model provider:model` flags onto participant ids.
///
/// An override applies to every participant whose base provider matches;
/// an override that matches nobody is an error.
pub fn model_overrides(
    flags: &[String],
    participants: &[String],
) -> Result<HashMap<String, String>, ArgumentError> {
    let mut overrides = HashMap::new();
    for flag in flags {
        let (provider, model) = flag
            .split_once(':')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| ArgumentError::InvalidModelOverride(flag.clone()))?;

        let mut matched = false;
        for id in participants {
            if provider_base_name(id) == provider {
                overrides.insert(id.clone(), model.to_string());
                matched = true;
            }
        }
        if !matched {
            return Err(ArgumentError::UnmatchedModelOverride {
                provider: provider.to_string(),
                model: model.to_string(),
            });
        }
    }
    Ok(overrides)
}
