//! Integration tests for rvw-ai API endpoints
//!
//! The full router runs against an in-memory database, with both AI
//! services served by a mock upstream.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::time::Duration;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rvw_ai::config::{AiConfig, Credentials, KeyPointSettings, SentimentSettings};
use rvw_ai::{build_router, AppState};
use rvw_common::config::TomlConfig;

/// Test helper: in-memory database with schema
async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    rvw_common::db::create_schema(&pool)
        .await
        .expect("Failed to initialize database schema");
    pool
}

/// Test helper: app wired to `upstream` with the given credentials
async fn create_test_app(upstream: &MockServer, credentials: Credentials) -> (axum::Router, SqlitePool) {
    let pool = test_pool().await;

    let mut config = AiConfig::from_parts(&TomlConfig::default(), None, None, credentials);
    config.sentiment = SentimentSettings {
        url_template: format!("{}/hf/{{model}}", upstream.uri()),
        model: "sentiment-model".to_string(),
        timeout: Duration::from_secs(2),
    };
    config.key_points = KeyPointSettings {
        url_template: format!("{}/gen/{{model}}:generateContent", upstream.uri()),
        models: vec!["first".to_string(), "second".to_string()],
        timeout: Duration::from_secs(2),
    };

    let state = AppState::from_config(pool.clone(), &config).expect("state");
    (build_router(state), pool)
}

fn full_credentials() -> Credentials {
    Credentials {
        hf_token: Some("hf_test".to_string()),
        gemini_key: Some("gm_test".to_string()),
    }
}

async fn mount_healthy_upstream(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path_regex("^/hf/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            { "label": "positive", "score": 0.88 },
            { "label": "neutral", "score": 0.1 },
            { "label": "negative", "score": 0.02 }
        ]])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex("^/gen/first"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "```json\n[\"Bright display\", \"Fast\", \"Pricey\"]\n```" }] }
            }]
        })))
        .mount(server)
        .await;
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn assert_cors_headers(response: &axum::response::Response) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(
        headers["access-control-allow-methods"],
        "POST,GET,OPTIONS,PUT,DELETE"
    );
    assert_eq!(
        headers["access-control-allow-headers"],
        "Origin, Content-Type, Accept, Authorization"
    );
}

async fn row_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// Analyze
// =============================================================================

#[tokio::test]
async fn test_analyze_review_success() {
    let upstream = MockServer::start().await;
    mount_healthy_upstream(&upstream).await;
    let (app, pool) = create_test_app(&upstream, full_credentials()).await;

    let response = app
        .oneshot(post_json(
            "/api/analyze-review",
            json!({ "product_name": "Monitor", "review_text": "Bright and fast, a bit pricey" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);

    let body = extract_json(response.into_body()).await;
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["product_name"], "Monitor");
    assert_eq!(body["review_text"], "Bright and fast, a bit pricey");
    assert_eq!(body["sentiment"], "POSITIVE");
    assert_eq!(body["confidence"], 0.88);
    assert_eq!(body["key_points"], json!(["Bright display", "Fast", "Pricey"]));
    assert!(body["created_at"].is_string());

    assert_eq!(row_count(&pool).await, 1);
}

#[tokio::test]
async fn test_analyze_review_missing_field_is_400() {
    let upstream = MockServer::start().await;
    let (app, pool) = create_test_app(&upstream, full_credentials()).await;

    for body in [
        json!({ "review_text": "No name given" }),
        json!({ "product_name": "Nameless" }),
        json!({ "product_name": "", "review_text": "Empty name" }),
    ] {
        let response = app
            .clone()
            .oneshot(post_json("/api/analyze-review", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors_headers(&response);

        let body = extract_json(response.into_body()).await;
        assert!(body["error"].is_string());
    }

    assert_eq!(row_count(&pool).await, 0);
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_review_invalid_json_is_400() {
    let upstream = MockServer::start().await;
    let (app, _pool) = create_test_app(&upstream, full_credentials()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze-review")
                .body(Body::from("product_name=Lamp"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analyze_review_without_content_type() {
    let upstream = MockServer::start().await;
    mount_healthy_upstream(&upstream).await;
    let (app, _pool) = create_test_app(&upstream, full_credentials()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analyze-review")
                .body(Body::from(
                    json!({ "product_name": "Lamp", "review_text": "Nice" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_analyze_review_upstream_down_still_stores_row() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&upstream)
        .await;
    let (app, pool) = create_test_app(&upstream, full_credentials()).await;

    let response = app
        .oneshot(post_json(
            "/api/analyze-review",
            json!({ "product_name": "Kettle", "review_text": "Boils water" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["sentiment"], "NEUTRAL");
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(
        body["key_points"],
        json!(["Failed to extract points (All models failed)"])
    );
    assert_eq!(row_count(&pool).await, 1);
}

#[tokio::test]
async fn test_analyze_review_without_credentials_stores_config_sentinels() {
    let upstream = MockServer::start().await;
    let (app, _pool) = create_test_app(&upstream, Credentials::default()).await;

    let response = app
        .oneshot(post_json(
            "/api/analyze-review",
            json!({ "product_name": "Chair", "review_text": "Comfortable" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["sentiment"], "CONFIG_ERROR");
    assert_eq!(body["confidence"], 0.0);
    assert_eq!(body["key_points"], json!(["Config Error"]));
    assert!(upstream.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_analyze_review_storage_failure_is_500() {
    let upstream = MockServer::start().await;
    mount_healthy_upstream(&upstream).await;
    let (app, pool) = create_test_app(&upstream, full_credentials()).await;
    sqlx::query("DROP TABLE reviews").execute(&pool).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/analyze-review",
            json!({ "product_name": "Fan", "review_text": "Quiet" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_cors_headers(&response);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("reviews"));

    // Recorded for diagnostics
    let health = app.oneshot(request("GET", "/health")).await.unwrap();
    let health = extract_json(health.into_body()).await;
    assert!(health["last_error"].is_string());
}

// =============================================================================
// List / clear
// =============================================================================

#[tokio::test]
async fn test_reviews_listed_most_recent_first() {
    let upstream = MockServer::start().await;
    mount_healthy_upstream(&upstream).await;
    let (app, _pool) = create_test_app(&upstream, full_credentials()).await;

    for name in ["Older", "Newer"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/analyze-review",
                json!({ "product_name": name, "review_text": "Fine" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(request("GET", "/api/reviews")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_cors_headers(&response);

    let body = extract_json(response.into_body()).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["product_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Newer", "Older"]);
}

#[tokio::test]
async fn test_clear_then_list_is_empty() {
    let upstream = MockServer::start().await;
    mount_healthy_upstream(&upstream).await;
    let (app, _pool) = create_test_app(&upstream, full_credentials()).await;

    app.clone()
        .oneshot(post_json(
            "/api/analyze-review",
            json!({ "product_name": "Toaster", "review_text": "Burns toast" }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("POST", "/api/clear-reviews"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!({ "message": "Deleted" }));

    let response = app.oneshot(request("GET", "/api/reviews")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_clear_failure_is_500() {
    let upstream = MockServer::start().await;
    let (app, pool) = create_test_app(&upstream, full_credentials()).await;
    sqlx::query("DROP TABLE reviews").execute(&pool).await.unwrap();

    let response = app
        .oneshot(request("POST", "/api/clear-reviews"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].is_string());
}

// =============================================================================
// Preflight / misc
// =============================================================================

#[tokio::test]
async fn test_options_preflight_on_all_routes() {
    let upstream = MockServer::start().await;
    let (app, _pool) = create_test_app(&upstream, full_credentials()).await;

    for uri in ["/api/analyze-review", "/api/reviews", "/api/clear-reviews"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri(uri)
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "preflight on {}", uri);
        assert_cors_headers(&response);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body, json!({}));
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let upstream = MockServer::start().await;
    let (app, _pool) = create_test_app(&upstream, full_credentials()).await;

    let response = app.oneshot(request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "rvw-ai");
    assert!(body["uptime_seconds"].is_u64());
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_unknown_route_is_404_json() {
    let upstream = MockServer::start().await;
    let (app, _pool) = create_test_app(&upstream, full_credentials()).await;

    let response = app.oneshot(request("GET", "/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = extract_json(response.into_body()).await;
    assert!(body["error"].as_str().unwrap().contains("/api/nope"));
}
