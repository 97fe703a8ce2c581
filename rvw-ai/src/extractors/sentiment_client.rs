//! Sentiment classification client
//!
//! Sends review text to a hosted text-classification model and reduces the
//! answer to a single canonical label with its confidence.
//!
//! # Wire format
//! - Request: `POST {url}` with `Authorization: Bearer <token>` and
//!   body `{"inputs": "<text>"}`
//! - Response: either a flat list `[{"label": .., "score": ..}, ..]` or a
//!   nested list `[[{"label": .., "score": ..}, ..]]`, depending on model
//!   and endpoint version
//!
//! # Degradation
//! - No token → `CONFIG_ERROR / 0.0`, no request made
//! - Any other failure → `NEUTRAL / 0.0`

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::label_normalizer::normalize_label;
use crate::config::SentimentSettings;
use crate::types::{Sentiment, SentimentClassifier, UpstreamError};
use rvw_common::config::is_valid_key;

/// Longest upstream error body echoed into logs
const MAX_LOGGED_BODY: usize = 200;

/// Sentiment classification client
pub struct SentimentClient {
    http_client: Client,
    /// Endpoint with the model already substituted
    endpoint: String,
    timeout: Duration,
}

impl SentimentClient {
    pub fn new(settings: &SentimentSettings) -> rvw_common::Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("rvw-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| rvw_common::Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: settings.url_template.replace("{model}", &settings.model),
            timeout: settings.timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, text: &str, token: &str) -> Result<Sentiment, UpstreamError> {
        debug!(endpoint = %self.endpoint, text_length = text.len(), "Requesting sentiment classification");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(token)
            .timeout(self.timeout)
            .json(&json!({ "inputs": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Unavailable(format!(
                "classification endpoint returned {}: {}",
                status,
                truncate(&body)
            )));
        }

        let body = response.text().await?;
        parse_classification(&body)
    }
}

#[async_trait]
impl SentimentClassifier for SentimentClient {
    fn name(&self) -> &'static str {
        "sentiment"
    }

    async fn classify(&self, text: &str, token: Option<&str>) -> Sentiment {
        let Some(token) = token.filter(|t| is_valid_key(t)) else {
            warn!(adapter = self.name(), "No token configured, skipping classification");
            return Sentiment::config_error();
        };

        match self.request(text, token).await {
            Ok(sentiment) => {
                debug!(label = %sentiment.label, score = sentiment.score, "Sentiment classified");
                sentiment
            }
            Err(e) => {
                warn!(adapter = self.name(), "Sentiment classification failed: {}", e);
                Sentiment::unavailable()
            }
        }
    }
}

// ============================================================================
// Response Types
// ============================================================================

/// One `{"label", "score"}` entry
///
/// Decoded through a JSON object only; derived struct decoding would also
/// accept positional arrays like `["LABEL_2", 0.9]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Deserialize)]
struct LabelScoreFields {
    label: String,
    score: f64,
}

impl TryFrom<Map<String, Value>> for LabelScore {
    type Error = serde_json::Error;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let fields: LabelScoreFields = serde_json::from_value(Value::Object(map))?;
        Ok(Self {
            label: fields.label,
            score: fields.score,
        })
    }
}

/// Accepted response shapes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Flat(Vec<LabelScore>),
    Nested(Vec<Vec<LabelScore>>),
}

impl ClassificationResponse {
    fn into_candidates(self) -> Vec<LabelScore> {
        match self {
            ClassificationResponse::Flat(entries) => entries,
            ClassificationResponse::Nested(groups) => groups.into_iter().flatten().collect(),
        }
    }
}

/// Parse a classification body and pick the strongest label
///
/// Ties resolve to the first maximum. Scores outside [0, 1] or non-finite
/// scores reject the whole response.
pub fn parse_classification(body: &str) -> Result<Sentiment, UpstreamError> {
    let response: ClassificationResponse = serde_json::from_str(body).map_err(|_| {
        UpstreamError::Malformed(format!("unrecognized classification shape: {}", truncate(body)))
    })?;

    let candidates = response.into_candidates();

    if let Some(bad) = candidates
        .iter()
        .find(|c| !c.score.is_finite() || !(0.0..=1.0).contains(&c.score))
    {
        return Err(UpstreamError::Malformed(format!(
            "score {} for label {} is outside [0, 1]",
            bad.score, bad.label
        )));
    }

    let mut best: Option<&LabelScore> = None;
    for candidate in &candidates {
        match best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }

    let best = best.ok_or_else(|| UpstreamError::Malformed("no classification candidates".to_string()))?;
    Ok(Sentiment::new(normalize_label(&best.label), best.score))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_LOGGED_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
