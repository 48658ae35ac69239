//! Configuration file loading for mars
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment variables: `MARS_<SECTION>__<KEY>` (e.g. `MARS_RETRY__MAX_RETRIES`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./mars.toml` or `./.mars.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/mars/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    DEFAULT_TIMEOUT_SECS, FileConfig, FileDebateConfig, FileProviderConfig, FileProvidersConfig,
    FileRetryConfig,
};
pub use loader::{ConfigError, ConfigLoader};
