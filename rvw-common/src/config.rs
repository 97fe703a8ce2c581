//! Bootstrap configuration loading
//!
//! The TOML file holds bootstrap settings only (database location, listen
//! address, logging, upstream endpoints and credentials). Every field is
//! optional; services fill gaps with compiled defaults.
//!
//! Config file lookup order:
//! 1. Explicit path (command-line argument)
//! 2. Environment variable naming a path
//! 3. `~/.config/rvw/<file_name>`
//! 4. `/etc/rvw/<file_name>` (Linux only)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 6543;

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Bind host for the HTTP server
    #[serde(default)]
    pub host: Option<String>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sentiment classification endpoint settings
    #[serde(default)]
    pub sentiment: SentimentSection,

    /// Key-point extraction endpoint settings
    #[serde(default)]
    pub key_points: KeyPointSection,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[sentiment]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentimentSection {
    /// Bearer token for the classification endpoint
    pub token: Option<String>,
    /// Endpoint URL, `{model}` is substituted
    pub url_template: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// `[key_points]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeyPointSection {
    /// API key for the generative endpoint
    pub api_key: Option<String>,
    /// Endpoint URL, `{model}` is substituted
    pub url_template: Option<String>,
    /// Candidate models, most capable first
    pub models: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

/// Locate the bootstrap config file
///
/// Returns `None` when no candidate exists. An explicit path or environment
/// path is returned even if missing so the caller can report it.
pub fn locate_config_file(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("rvw").join(file_name));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/rvw").join(file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rvw"))
        .unwrap_or_else(|| PathBuf::from("./rvw_data"))
        .join("rvw.db")
}

/// Credential validity check (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
