//! Service configuration for rvw-ai
//!
//! Built once at startup from CLI arguments, environment and the bootstrap
//! TOML file, then passed explicitly into the components that need it.
//!
//! Credential priority: ENV (including a `.env` file) → TOML. Missing
//! credentials are not fatal; the adapters return sentinel values instead.

use rvw_common::config::{is_valid_key, TomlConfig, DEFAULT_HOST, DEFAULT_PORT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the classification bearer token
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

/// Environment variable holding the generative API key
pub const GEMINI_KEY_ENV: &str = "GEMINI_KEY";

pub const DEFAULT_SENTIMENT_URL_TEMPLATE: &str =
    "https://router.huggingface.co/hf-inference/models/{model}";
pub const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";
pub const DEFAULT_SENTIMENT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_KEY_POINT_URL_TEMPLATE: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent";
/// Most capable first
pub const DEFAULT_KEY_POINT_MODELS: [&str; 3] =
    ["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash-latest"];
pub const DEFAULT_KEY_POINT_TIMEOUT: Duration = Duration::from_secs(15);

/// Classification endpoint settings
#[derive(Debug, Clone)]
pub struct SentimentSettings {
    pub url_template: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_SENTIMENT_URL_TEMPLATE.to_string(),
            model: DEFAULT_SENTIMENT_MODEL.to_string(),
            timeout: DEFAULT_SENTIMENT_TIMEOUT,
        }
    }
}

/// Generative endpoint settings
#[derive(Debug, Clone)]
pub struct KeyPointSettings {
    pub url_template: String,
    pub models: Vec<String>,
    pub timeout: Duration,
}

impl Default for KeyPointSettings {
    fn default() -> Self {
        Self {
            url_template: DEFAULT_KEY_POINT_URL_TEMPLATE.to_string(),
            models: DEFAULT_KEY_POINT_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout: DEFAULT_KEY_POINT_TIMEOUT,
        }
    }
}

/// Upstream credentials, `None` when not configured
#[derive(Clone, Default)]
pub struct Credentials {
    pub hf_token: Option<String>,
    pub gemini_key: Option<String>,
}

// Never print credential values
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<set>"))
            .field("gemini_key", &self.gemini_key.as_ref().map(|_| "<set>"))
            .finish()
    }
}

/// Complete rvw-ai configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub sentiment: SentimentSettings,
    pub key_points: KeyPointSettings,
    pub credentials: Credentials,
}

impl AiConfig {
    /// Merge CLI/env overrides, environment credentials and TOML values
    ///
    /// `port` and `database_path` come from clap (which already folds in
    /// their environment variables) and win over TOML.
    pub fn resolve(
        toml: &TomlConfig,
        port: Option<u16>,
        database_path: Option<PathBuf>,
    ) -> Self {
        let credentials = Credentials {
            hf_token: resolve_credential(
                HF_TOKEN_ENV,
                std::env::var(HF_TOKEN_ENV).ok(),
                toml.sentiment.token.as_deref(),
            ),
            gemini_key: resolve_credential(
                GEMINI_KEY_ENV,
                std::env::var(GEMINI_KEY_ENV).ok(),
                toml.key_points.api_key.as_deref(),
            ),
        };
        Self::from_parts(toml, port, database_path, credentials)
    }

    /// Same as [`AiConfig::resolve`] with credentials supplied by the caller
    pub fn from_parts(
        toml: &TomlConfig,
        port: Option<u16>,
        database_path: Option<PathBuf>,
        credentials: Credentials,
    ) -> Self {
        let sentiment_defaults = SentimentSettings::default();
        let sentiment = SentimentSettings {
            url_template: toml
                .sentiment
                .url_template
                .clone()
                .unwrap_or(sentiment_defaults.url_template),
            model: toml
                .sentiment
                .model
                .clone()
                .unwrap_or(sentiment_defaults.model),
            timeout: toml
                .sentiment
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(sentiment_defaults.timeout),
        };

        let key_point_defaults = KeyPointSettings::default();
        let models: Vec<String> = toml
            .key_points
            .models
            .iter()
            .flatten()
            .filter(|m| !m.trim().is_empty())
            .cloned()
            .collect();
        let models = if models.is_empty() {
            if toml.key_points.models.is_some() {
                warn!("key_points.models is empty, using built-in model list");
            }
            key_point_defaults.models
        } else {
            models
        };
        let key_points = KeyPointSettings {
            url_template: toml
                .key_points
                .url_template
                .clone()
                .unwrap_or(key_point_defaults.url_template),
            models,
            timeout: toml
                .key_points
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(key_point_defaults.timeout),
        };

        Self {
            database_path: database_path
                .or_else(|| toml.database_path.clone())
                .unwrap_or_else(rvw_common::config::default_database_path),
            host: toml.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.or(toml.port).unwrap_or(DEFAULT_PORT),
            sentiment,
            key_points,
            credentials,
        }
    }

    /// Log where settings came from and which credentials are present
    /// (never their values)
    pub fn log_system_check(&self, env_file: Option<&Path>) {
        match env_file {
            Some(path) => info!("Env file: {}", path.display()),
            None => info!("No .env file found (using process environment)"),
        }
        match self.credentials.hf_token {
            Some(_) => info!("Sentiment token: configured"),
            None => warn!(
                "Sentiment token missing ({} or [sentiment].token): reviews will be stored as CONFIG_ERROR",
                HF_TOKEN_ENV
            ),
        }
        match self.credentials.gemini_key {
            Some(_) => info!("Key-point API key: configured"),
            None => warn!(
                "Key-point API key missing ({} or [key_points].api_key): key points will read \"Config Error\"",
                GEMINI_KEY_ENV
            ),
        }
        info!(
            "Key-point candidate models: {}",
            self.key_points.models.join(", ")
        );
    }
}

/// Load `KEY=value` lines from a `.env` file into the process environment
///
/// With no explicit path, `.env` is searched in the working directory and its
/// parents. Variables already set in the environment are left untouched.
/// Returns the file that was loaded, if any.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(path) => dotenvy::from_path(path).ok().map(|_| path.to_path_buf()),
        None => dotenvy::dotenv().ok(),
    }
}

/// Resolve one credential from environment then TOML
///
/// Blank values are ignored. Warns when several sources carry a value.
pub fn resolve_credential(
    name: &str,
    env_value: Option<String>,
    toml_value: Option<&str>,
) -> Option<String> {
    let env_value = env_value.filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in environment and TOML. Using environment (highest priority).",
            name
        );
    }

    env_value
        .or_else(|| toml_value.map(str::to_string))
        .map(|v| v.trim().to_string())
}
