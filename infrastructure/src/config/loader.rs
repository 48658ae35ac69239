//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Project-level config file names, checked in order
const PROJECT_CONFIG_FILES: &[&str] = &["mars.toml", ".mars.toml"];

/// Prefix for environment overrides (`MARS_RETRY__MAX_RETRIES=5`)
const ENV_PREFIX: &str = "MARS_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. `MARS_` environment variables, `__` separating section and key
    /// 2. Explicit config path (if provided)
    /// 3. Project root: `./mars.toml` or `./.mars.toml`
    /// 4. XDG config: `$XDG_CONFIG_HOME/mars/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, ConfigError> {
        let mut files = Vec::new();

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            check_permissions(&global_path);
            files.push(global_path);
        }

        if let Some(project_path) = Self::project_config_path() {
            files.push(project_path);
        }

        if let Some(path) = config_path {
            files.push(path.to_path_buf());
        }

        Self::load_from(&files)
    }

    /// Merge the given files (lowest priority first) over the defaults,
    /// then apply environment overrides and validate.
    pub fn load_from(files: &[PathBuf]) -> Result<FileConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in files {
            debug!(path = %path.display(), "Merging config file");
            figment = figment.merge(Toml::file(path));
        }

        let config: FileConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;

        let issues = config.validate();
        if !issues.is_empty() {
            return Err(ConfigError::Invalid(issues));
        }
        Ok(config)
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// Get the global config file path
    ///
    /// Returns XDG_CONFIG_HOME/mars/config.toml if set,
    /// otherwise the platform config directory equivalent.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mars").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

/// Warn when a file that may hold API keys is readable by other users.
#[cfg(unix)]
fn check_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let Ok(metadata) = std::fs::metadata(path) else {
        return;
    };
    let mode = metadata.permissions().mode() & 0o777;
    if mode & 0o044 != 0 {
        warn!(
            "{} is readable by other users (mode {:o}). Run: chmod 600 {}",
            path.display(),
            mode,
            path.display()
        );
    }
}

#[cfg(not(unix))]
fn check_permissions(_path: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.debate.default_providers.is_empty());
        assert_eq!(config.debate.max_rounds, 3);
        assert_eq!(config.retry.max_retries, 3);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        // Should return a path (even if file doesn't exist)
        let path = ConfigLoader::global_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.ends_with("mars/config.toml"));
    }

    #[test]
    fn test_later_files_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_config(
            &dir,
            "global.toml",
            r#"
[debate]
max_rounds = 5
max_tokens = 2048

[providers.openai]
default_model = "gpt-4.1"
"#,
        );
        let project = write_config(
            &dir,
            "project.toml",
            r#"
[debate]
max_rounds = 2
"#,
        );

        let config = ConfigLoader::load_from(&[global, project]).unwrap();
        assert_eq!(config.debate.max_rounds, 2);
        assert_eq!(config.debate.max_tokens, 2048);
        assert_eq!(
            config.providers.openai.default_model.as_deref(),
            Some("gpt-4.1")
        );
        assert_eq!(config.retry.base_delay_ms, 1000);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "bad.toml",
            r#"
[debate]
convergence_threshold = 2.0
"#,
        );

        let err = ConfigLoader::load_from(&[path]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref issues) if issues.len() == 1));
        assert!(err.to_string().contains("convergence_threshold"));
    }

    #[test]
    fn test_malformed_toml_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "broken.toml", "[debate\nmax_rounds = ");

        let err = ConfigLoader::load_from(&[path]).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
