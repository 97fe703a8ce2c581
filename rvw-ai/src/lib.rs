//! rvw-ai library interface
//!
//! Review enrichment service: accepts product reviews, classifies their
//! sentiment, extracts key points with a generative model, and stores the
//! combined result.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod services;
pub mod types;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::config::AiConfig;
use crate::extractors::{KeyPointClient, SentimentClient};
use crate::services::EnrichmentOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Review enrichment pipeline
    pub orchestrator: Arc<EnrichmentOrchestrator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last internal error for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, orchestrator: Arc<EnrichmentOrchestrator>) -> Self {
        Self {
            db,
            orchestrator,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Wire the HTTP adapters described by `config`
    pub fn from_config(db: SqlitePool, config: &AiConfig) -> rvw_common::Result<Self> {
        let sentiment = Arc::new(SentimentClient::new(&config.sentiment)?);
        let key_points = Arc::new(KeyPointClient::new(&config.key_points)?);
        let orchestrator = EnrichmentOrchestrator::new(
            db.clone(),
            sentiment,
            key_points,
            config.credentials.clone(),
        );
        Ok(Self::new(db, Arc::new(orchestrator)))
    }

    /// Remember an internal error for `/health`
    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .merge(api::review_routes())
        .merge(api::health_routes())
        .fallback(api::not_found);

    api::with_cors_headers(routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
