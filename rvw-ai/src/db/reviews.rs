//! Review persistence
//!
//! Rows are written once, fully formed, and never updated. The only
//! mutation besides insert is deleting every row.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;

use rvw_common::{Error, NewReview, Result, Review, SentimentLabel};

/// Insert a review and return it with its assigned id and timestamp
pub async fn insert_review(pool: &SqlitePool, review: NewReview) -> Result<Review> {
    // Serialize before opening the transaction
    let key_points = serde_json::to_string(&review.key_points)
        .map_err(|e| Error::Internal(format!("Failed to serialize key points: {}", e)))?;
    let created_at = Utc::now();

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO reviews (
            product_name, review_text, sentiment, confidence, key_points, created_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&review.product_name)
    .bind(&review.review_text)
    .bind(review.sentiment.as_str())
    .bind(review.confidence)
    .bind(&key_points)
    .bind(format_timestamp(&created_at))
    .execute(&mut *tx)
    .await?;

    let id = result.last_insert_rowid();
    tx.commit().await?;

    // Round-trip through storage precision
    let created_at = parse_timestamp(&format_timestamp(&created_at))?;
    Ok(review.into_review(id, created_at))
}

/// All reviews, most recent first
pub async fn list_reviews(pool: &SqlitePool) -> Result<Vec<Review>> {
    let rows = sqlx::query(
        r#"
        SELECT id, product_name, review_text, sentiment, confidence, key_points, created_at
        FROM reviews
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(review_from_row).collect()
}

/// Delete every review, returning the number of rows removed
pub async fn delete_all_reviews(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM reviews").execute(pool).await?;
    Ok(result.rows_affected())
}

/// Insert the placeholder row used to verify a fresh installation
pub async fn seed_system_check(pool: &SqlitePool) -> Result<Review> {
    let review = insert_review(
        pool,
        NewReview {
            product_name: "System Check".to_string(),
            review_text: "Database initialization successful!".to_string(),
            sentiment: SentimentLabel::Positive,
            confidence: 1.0,
            key_points: vec!["System Ready".to_string()],
        },
    )
    .await?;
    info!("Seeded system check review (id {})", review.id);
    Ok(review)
}

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let sentiment: String = row.try_get("sentiment")?;
    let key_points: Option<String> = row.try_get("key_points")?;
    let key_points = match key_points.as_deref().map(str::trim) {
        None | Some("") => Vec::new(),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| Error::Internal(format!("Failed to deserialize key points: {}", e)))?,
    };
    let created_at: String = row.try_get("created_at")?;

    Ok(Review {
        id: row.try_get("id")?,
        product_name: row.try_get("product_name")?,
        review_text: row.try_get("review_text")?,
        sentiment: sentiment.parse()?,
        confidence: row.try_get("confidence")?,
        key_points,
        created_at: parse_timestamp(&created_at)?,
    })
}

/// Fixed-width UTC form so text order matches time order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse created_at '{}': {}", raw, e)))
}
