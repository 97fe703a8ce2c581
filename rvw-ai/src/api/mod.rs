//! HTTP API handlers for rvw-ai

pub mod cors;
pub mod health;
pub mod reviews;

pub use cors::with_cors_headers;
pub use health::health_routes;
pub use reviews::{not_found, review_routes};
