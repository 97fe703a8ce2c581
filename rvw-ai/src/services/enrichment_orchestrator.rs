//! Enrichment orchestrator
//!
//! Validates an incoming review, runs both adapters concurrently, and
//! persists the review together with its enrichment in one insert.
//!
//! Adapter failures never reach this layer (they degrade to sentinels).
//! Only validation and persistence failures are reported to the caller.

use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Credentials;
use crate::db;
use crate::types::{EnrichmentResult, KeyPointExtractor, SentimentClassifier};
use rvw_common::{NewReview, Review};

/// Longest accepted product name, in characters
pub const MAX_PRODUCT_NAME_CHARS: usize = 200;

/// Orchestrator failure
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Missing or invalid input field
    #[error("{0}")]
    Validation(String),

    /// Storing the review failed
    #[error("Failed to store review: {0}")]
    Persistence(#[from] rvw_common::Error),
}

/// Review enrichment pipeline
pub struct EnrichmentOrchestrator {
    db: SqlitePool,
    sentiment: Arc<dyn SentimentClassifier>,
    key_points: Arc<dyn KeyPointExtractor>,
    credentials: Credentials,
}

impl EnrichmentOrchestrator {
    pub fn new(
        db: SqlitePool,
        sentiment: Arc<dyn SentimentClassifier>,
        key_points: Arc<dyn KeyPointExtractor>,
        credentials: Credentials,
    ) -> Self {
        Self {
            db,
            sentiment,
            key_points,
            credentials,
        }
    }

    /// Enrich and store a review
    ///
    /// Inputs are stored exactly as given; validation only rejects blank
    /// fields and over-long product names.
    pub async fn enrich(
        &self,
        product_name: Option<&str>,
        review_text: Option<&str>,
    ) -> Result<Review, EnrichError> {
        let (product_name, review_text) = validate_input(product_name, review_text)?;

        info!(product = %product_name, "Analyzing review");

        let enrichment = self.analyze(review_text).await;

        let review = NewReview {
            product_name: product_name.to_string(),
            review_text: review_text.to_string(),
            sentiment: enrichment.label,
            confidence: enrichment.score,
            key_points: enrichment.key_points,
        };

        let stored = db::insert_review(&self.db, review).await.map_err(|e| {
            error!("Failed to store review for {}: {}", product_name, e);
            EnrichError::Persistence(e)
        })?;

        info!(
            review_id = stored.id,
            sentiment = %stored.sentiment,
            confidence = stored.confidence,
            "Review stored"
        );

        Ok(stored)
    }

    /// Run both adapters concurrently; neither can fail
    pub async fn analyze(&self, review_text: &str) -> EnrichmentResult {
        let (sentiment, key_points) = tokio::join!(
            self.sentiment
                .classify(review_text, self.credentials.hf_token.as_deref()),
            self.key_points
                .extract(review_text, self.credentials.gemini_key.as_deref())
        );
        EnrichmentResult::new(sentiment, key_points)
    }
}

/// Check required fields, returning them on success
pub fn validate_input<'a>(
    product_name: Option<&'a str>,
    review_text: Option<&'a str>,
) -> Result<(&'a str, &'a str), EnrichError> {
    let product_name = product_name
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| EnrichError::Validation("product_name is required".to_string()))?;
    let review_text = review_text
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| EnrichError::Validation("review_text is required".to_string()))?;

    if product_name.chars().count() > MAX_PRODUCT_NAME_CHARS {
        return Err(EnrichError::Validation(format!(
            "product_name must be at most {} characters",
            MAX_PRODUCT_NAME_CHARS
        )));
    }

    Ok((product_name, review_text))
}
