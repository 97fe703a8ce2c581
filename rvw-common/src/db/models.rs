//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Canonical sentiment label stored with every review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    /// Classification skipped because no credential was configured
    ConfigError,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "POSITIVE" => Ok(SentimentLabel::Positive),
            "NEGATIVE" => Ok(SentimentLabel::Negative),
            "NEUTRAL" => Ok(SentimentLabel::Neutral),
            "CONFIG_ERROR" => Ok(SentimentLabel::ConfigError),
            other => Err(Error::Internal(format!("Unknown sentiment label: {}", other))),
        }
    }
}

/// Persisted review with its enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub product_name: String,
    pub review_text: String,
    pub sentiment: SentimentLabel,
    /// 0.0 - 1.0, 0.0 when classification failed
    pub confidence: f64,
    pub key_points: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Fully resolved review awaiting insertion
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub product_name: String,
    pub review_text: String,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub key_points: Vec<String>,
}

impl NewReview {
    /// Attach the id and creation time assigned by storage
    pub fn into_review(self, id: i64, created_at: DateTime<Utc>) -> Review {
        Review {
            id,
            product_name: self.product_name,
            review_text: self.review_text,
            sentiment: self.sentiment,
            confidence: self.confidence,
            key_points: self.key_points,
            created_at,
        }
    }
}
