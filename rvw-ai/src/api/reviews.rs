//! Review endpoints
//!
//! - `POST /api/analyze-review`: enrich and store a review
//! - `GET /api/reviews`: list reviews, newest first
//! - `POST /api/clear-reviews`: delete every review
//!
//! Each route also answers `OPTIONS` for CORS preflight.

use axum::{
    body::Bytes,
    extract::State,
    http::Uri,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use rvw_common::Review;

/// Body of `POST /api/analyze-review`
///
/// Fields are optional here so that a missing field becomes a 400 with a
/// precise message instead of a generic decode failure.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeReviewRequest {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub review_text: Option<String>,
}

/// Body of `POST /api/clear-reviews`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/analyze-review
///
/// The body is read as raw bytes so clients that omit the JSON content type
/// are still served.
pub async fn analyze_review(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Review>> {
    let request: AnalyzeReviewRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let result = state
        .orchestrator
        .enrich(
            request.product_name.as_deref(),
            request.review_text.as_deref(),
        )
        .await
        .map_err(ApiError::from);

    match result {
        Ok(review) => Ok(Json(review)),
        Err(err) => {
            if err.status().is_server_error() {
                state.record_error(err.to_string()).await;
            }
            Err(err)
        }
    }
}

/// GET /api/reviews
pub async fn get_reviews(State(state): State<AppState>) -> ApiResult<Json<Vec<Review>>> {
    match db::list_reviews(&state.db).await {
        Ok(reviews) => Ok(Json(reviews)),
        Err(e) => {
            error!("Failed to list reviews: {}", e);
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// POST /api/clear-reviews
pub async fn clear_reviews(State(state): State<AppState>) -> ApiResult<Json<MessageResponse>> {
    match db::delete_all_reviews(&state.db).await {
        Ok(deleted) => {
            info!("Deleted {} reviews", deleted);
            Ok(Json(MessageResponse {
                message: "Deleted".to_string(),
            }))
        }
        Err(e) => {
            error!("Failed to delete reviews: {}", e);
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// OPTIONS preflight, headers are added by the CORS layer
pub async fn preflight() -> Json<Value> {
    Json(json!({}))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/analyze-review",
            post(analyze_review).options(preflight),
        )
        .route("/api/reviews", get(get_reviews).options(preflight))
        .route("/api/clear-reviews", post(clear_reviews).options(preflight))
}
