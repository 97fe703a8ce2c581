//! Base traits and types for the enrichment pipeline
//!
//! Each external AI service sits behind an adapter trait. Adapters absorb
//! every upstream failure and return a degraded-but-valid value, so the
//! orchestrator never has to branch on upstream errors.

use async_trait::async_trait;
use rvw_common::SentimentLabel;
use thiserror::Error;

/// Upstream failure taxonomy
///
/// Only used inside adapters for logging and control flow. Never crosses
/// the adapter boundary.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Non-2xx status, network error or timeout
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),

    /// Response body did not have a recognized shape
    #[error("Malformed upstream response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Unavailable(format!("request timed out: {}", err))
        } else if err.is_decode() {
            UpstreamError::Malformed(err.to_string())
        } else {
            UpstreamError::Unavailable(err.to_string())
        }
    }
}

/// Sentiment classification outcome
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentiment {
    pub label: SentimentLabel,
    /// Confidence of the chosen label, 0.0 - 1.0
    pub score: f64,
}

impl Sentiment {
    pub fn new(label: SentimentLabel, score: f64) -> Self {
        Self { label, score }
    }

    /// Returned when no credential is configured
    pub fn config_error() -> Self {
        Self::new(SentimentLabel::ConfigError, 0.0)
    }

    /// Returned on any upstream failure
    pub fn unavailable() -> Self {
        Self::new(SentimentLabel::Neutral, 0.0)
    }
}

/// Combined enrichment attached to a new review
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentResult {
    pub label: SentimentLabel,
    pub score: f64,
    pub key_points: Vec<String>,
}

impl EnrichmentResult {
    pub fn new(sentiment: Sentiment, key_points: Vec<String>) -> Self {
        Self {
            label: sentiment.label,
            score: sentiment.score,
            key_points,
        }
    }
}

/// Sentiment classification adapter
///
/// Implementations must be total: every failure degrades to
/// [`Sentiment::config_error`] or [`Sentiment::unavailable`].
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    async fn classify(&self, text: &str, token: Option<&str>) -> Sentiment;
}

/// Key-point extraction adapter
///
/// Implementations must be total: every failure degrades to a sentinel list.
#[async_trait]
pub trait KeyPointExtractor: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    async fn extract(&self, text: &str, api_key: Option<&str>) -> Vec<String>;
}
