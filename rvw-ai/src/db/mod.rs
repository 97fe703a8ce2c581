//! Database access for rvw-ai

pub mod reviews;

pub use reviews::{delete_all_reviews, insert_review, list_reviews, seed_system_check};
