//! Sentiment label normalization
//!
//! Classification models disagree on vocabulary: some emit `LABEL_0..2`,
//! others `negative`/`neutral`/`positive` in any case. Everything is folded
//! into [`SentimentLabel`].

use rvw_common::SentimentLabel;

/// Map an upstream label to the canonical enum
///
/// Positive markers are checked before negative ones. Unrecognized labels
/// (including `LABEL_1` and `neutral`) map to `NEUTRAL`.
pub fn normalize_label(raw: &str) -> SentimentLabel {
    let label = raw.to_uppercase();
    if label.contains("LABEL_2") || label.contains("POSITIVE") {
        SentimentLabel::Positive
    } else if label.contains("LABEL_0") || label.contains("NEGATIVE") {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}
