//! # RVW Common Library
//!
//! Shared code for the RVW review services including:
//! - Review data model and sentiment labels
//! - Database initialization
//! - Bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod db;
pub mod error;

pub use db::models::{NewReview, Review, SentimentLabel};
pub use error::{Error, Result};
