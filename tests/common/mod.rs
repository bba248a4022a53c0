#![allow(dead_code)]

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tower::ServiceExt;

use templog_api::{app, auth::TokenVerifier, database, state::AppState};

pub const PROJECT_ID: &str = "templog-test";

/// Build an in-process app over a fresh in-memory database.
///
/// The verifier runs claims-only here (no JWKS configured), which lets the
/// suite forge tokens. That is a deliberate difference from production,
/// where signatures are verified against the provider's keys.
pub async fn test_app() -> Result<(Router, SqlitePool)> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    database::migrate(&pool).await?;

    let verifier =
        TokenVerifier::new(PROJECT_ID.to_string(), "securetoken.google.com".to_string());
    let router = app(AppState::new(pool.clone(), verifier));
    Ok((router, pool))
}

fn encode_token(payload: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "none", "typ": "JWT"}).to_string());
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}

/// A token whose claims pass every verifier check.
pub fn token_for(subject: &str) -> String {
    let now = Utc::now().timestamp();
    encode_token(json!({
        "sub": subject,
        "email": format!("{subject}@example.com"),
        "aud": PROJECT_ID,
        "iss": format!("https://securetoken.google.com/{PROJECT_ID}"),
        "iat": now - 60,
        "exp": now + 3600,
    }))
}

pub fn expired_token_for(subject: &str) -> String {
    let now = Utc::now().timestamp();
    encode_token(json!({
        "sub": subject,
        "aud": PROJECT_ID,
        "iss": format!("https://securetoken.google.com/{PROJECT_ID}"),
        "iat": now - 7200,
        "exp": now - 3600,
    }))
}

pub fn wrong_audience_token_for(subject: &str) -> String {
    let now = Utc::now().timestamp();
    encode_token(json!({
        "sub": subject,
        "aud": "some-other-project",
        "iss": format!("https://securetoken.google.com/{PROJECT_ID}"),
        "iat": now - 60,
        "exp": now + 3600,
    }))
}

/// Drive one request through the router and decode the JSON envelope.
pub async fn request(
    router: &Router,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

/// Register a fresh account and return the response `data` (user, default
/// location, default checkpoints).
pub async fn register(router: &Router, subject: &str) -> Result<Value> {
    let (status, body) = request(
        router,
        "POST",
        "/api/auth/register",
        Some(&token_for(subject)),
        Some(json!({
            "email": format!("{subject}@example.com"),
            "display_name": "Owner",
            "business_name": format!("{subject} diner"),
            "business_type": "restaurant",
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {body}");
    Ok(body["data"].clone())
}

pub fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap_or_default()
}

pub fn error_reason(body: &Value) -> &str {
    body["error"]["details"]["reason"].as_str().unwrap_or_default()
}
