//! Key-point extraction client
//!
//! Asks a generative text model for three short key points and parses the
//! JSON array it embeds in its free-text answer.
//!
//! # Model fallback
//! Candidate models are tried in order (most capable first):
//! - 200 → parse the answer and stop, whether or not parsing succeeds
//! - 404 → model unavailable, try the next one
//! - any other status, network error or timeout → try the next one
//!
//! When no candidate answers with 200 the all-failed sentinel is returned.
//!
//! # Wire format
//! - Request: `POST {url}?key=<api key>` with
//!   `{"contents": [{"parts": [{"text": "<prompt>"}]}]}`
//! - Response: `{"candidates": [{"content": {"parts": [{"text": ".."}]}}]}`

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::KeyPointSettings;
use crate::types::{KeyPointExtractor, UpstreamError};
use rvw_common::config::is_valid_key;

/// Returned when no API key is configured
pub const CONFIG_ERROR_POINT: &str = "Config Error";

/// Returned when a model answered but its text was not a JSON string array
pub const PARSE_ERROR_POINT: &str = "Analysis Done (Parsing Error)";

/// Returned when every candidate model failed
pub const ALL_FAILED_POINT: &str = "Failed to extract points (All models failed)";

/// Outcome of a single model attempt
#[derive(Debug)]
enum Attempt {
    Parsed(Vec<String>),
    Unparseable(UpstreamError),
    NotFound,
    Failed(UpstreamError),
}

/// Key-point extraction client
pub struct KeyPointClient {
    http_client: Client,
    url_template: String,
    models: Vec<String>,
    timeout: Duration,
}

impl KeyPointClient {
    pub fn new(settings: &KeyPointSettings) -> rvw_common::Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("rvw-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| rvw_common::Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            url_template: settings.url_template.clone(),
            models: settings.models.clone(),
            timeout: settings.timeout,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        self.url_template.replace("{model}", model)
    }

    async fn attempt(&self, model: &str, text: &str, api_key: &str) -> Attempt {
        let body = json!({
            "contents": [{
                "parts": [{ "text": build_prompt(text) }]
            }]
        });

        // The key travels as a query parameter; log the model, never the URL
        let response = match self
            .http_client
            .post(self.endpoint(model))
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(e.into()),
        };

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Attempt::NotFound,
            status => {
                return Attempt::Failed(UpstreamError::Unavailable(format!(
                    "generative endpoint returned {}",
                    status
                )))
            }
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Attempt::Failed(e.into()),
        };

        match parse_key_points(&body) {
            Ok(points) => Attempt::Parsed(points),
            Err(e) => Attempt::Unparseable(e),
        }
    }
}

#[async_trait]
impl KeyPointExtractor for KeyPointClient {
    fn name(&self) -> &'static str {
        "key_points"
    }

    async fn extract(&self, text: &str, api_key: Option<&str>) -> Vec<String> {
        let Some(api_key) = api_key.filter(|k| is_valid_key(k)) else {
            warn!(adapter = self.name(), "No API key configured, skipping key-point extraction");
            return vec![CONFIG_ERROR_POINT.to_string()];
        };

        for model in &self.models {
            match self.attempt(model, text, api_key).await {
                Attempt::Parsed(points) => {
                    info!(model = %model, count = points.len(), "Key points extracted");
                    return points;
                }
                Attempt::Unparseable(e) => {
                    warn!(adapter = self.name(), model = %model, "Key-point answer not usable: {}", e);
                    return vec![PARSE_ERROR_POINT.to_string()];
                }
                Attempt::NotFound => {
                    debug!(model = %model, "Model not found, trying next candidate");
                }
                Attempt::Failed(e) => {
                    warn!(adapter = self.name(), model = %model, "Key-point request failed: {}", e);
                }
            }
        }

        warn!(adapter = self.name(), "All {} key-point models failed", self.models.len());
        vec![ALL_FAILED_POINT.to_string()]
    }
}

/// Instruction sent to the generative model
pub fn build_prompt(review_text: &str) -> String {
    format!(
        "Extract 3 key points from this review. Return ONLY a JSON array of 3 short strings. Review: {}",
        review_text
    )
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ContentCandidate>,
}

#[derive(Debug, Deserialize)]
struct ContentCandidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Locate the generated text and parse the key points out of it
pub fn parse_key_points(body: &str) -> Result<Vec<String>, UpstreamError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| UpstreamError::Malformed(format!("unrecognized response envelope: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(UpstreamError::Malformed("response contains no generated text".to_string()));
    }

    parse_points_text(&text)
}

/// Parse generated text as a JSON array of strings, ignoring code fences
pub fn parse_points_text(text: &str) -> Result<Vec<String>, UpstreamError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str::<Vec<String>>(&cleaned)
        .map_err(|e| UpstreamError::Malformed(format!("generated text is not a JSON string array: {}", e)))
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn test_fenced_array() {
        let body = envelope("```json\n[\"a\",\"b\",\"c\"]\n```");
        assert_eq!(parse_key_points(&body).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_bare_array_with_whitespace() {
        let body = envelope("  \n[\"Fast shipping\", \"Good battery\"]\n ");
        assert_eq!(
            parse_key_points(&body).unwrap(),
            vec!["Fast shipping", "Good battery"]
        );
    }

    #[test]
    fn test_text_split_across_parts() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "[\"a\", " }, { "text": "\"b\"]" }] }
            }]
        })
        .to_string();
        assert_eq!(parse_key_points(&body).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_prose_is_unparseable() {
        let body = envelope("Here are the key points: battery, screen, price.");
        assert!(matches!(parse_key_points(&body), Err(UpstreamError::Malformed(_))));
    }

    #[test]
    fn test_non_string_array_is_unparseable() {
        let body = envelope("[1, 2, 3]");
        assert!(parse_key_points(&body).is_err());
    }

    #[test]
    fn test_missing_candidates_is_unparseable() {
        assert!(parse_key_points(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).is_err());
        assert!(parse_key_points(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).is_err());
        assert!(parse_key_points("<html>").is_err());
    }

    #[test]
    fn test_prompt_embeds_review() {
        let prompt = build_prompt("Battery died in a day");
        assert!(prompt.contains("JSON array"));
        assert!(prompt.ends_with("Review: Battery died in a day"));
    }

    #[tokio::test]
    async fn test_missing_key_is_config_error() {
        let settings = KeyPointSettings {
            url_template: "http://127.0.0.1:9/{model}".to_string(),
            models: vec!["m".to_string()],
            timeout: Duration::from_millis(100),
        };
        let client = KeyPointClient::new(&settings).unwrap();
        assert_eq!(client.name(), "key_points");
        assert_eq!(client.extract("text", None).await, vec![CONFIG_ERROR_POINT]);
        assert_eq!(client.extract("text", Some("")).await, vec![CONFIG_ERROR_POINT]);
    }
}
