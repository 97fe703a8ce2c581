//! Error types for rvw-ai HTTP handlers
//!
//! Every error renders as `{"error": "<message>"}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::EnrichError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unknown route (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// rvw-common error (500)
    #[error(transparent)]
    Common(#[from] rvw_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EnrichError> for ApiError {
    fn from(err: EnrichError) -> Self {
        match err {
            EnrichError::Validation(msg) => ApiError::BadRequest(msg),
            EnrichError::Persistence(e) => ApiError::Common(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err: ApiError = EnrichError::Validation("review_text is required".into()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "review_text is required");
    }

    #[test]
    fn test_persistence_maps_to_internal() {
        let err: ApiError =
            EnrichError::Persistence(rvw_common::Error::Internal("disk full".into())).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("disk full"));
    }
}
