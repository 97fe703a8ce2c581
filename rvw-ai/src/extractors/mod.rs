//! Adapters for the external AI services
//!
//! - [`sentiment_client`]: text classification → canonical sentiment label
//! - [`key_point_client`]: generative model → short key-point list
//! - [`label_normalizer`]: upstream label vocabulary → [`rvw_common::SentimentLabel`]

pub mod key_point_client;
pub mod label_normalizer;
pub mod sentiment_client;

pub use key_point_client::KeyPointClient;
pub use label_normalizer::normalize_label;
pub use sentiment_client::SentimentClient;
