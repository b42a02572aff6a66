//! Common test utilities for integration tests.
//!
//! The app under test runs on the in-memory backend with a mock channel
//! sender, so these tests need no database or provider.

// Helpers are shared by several test binaries; not every binary uses all of them.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use domain::services::{ChannelSender, MockChannelSender};
use fake::{faker::internet::en::SafeEmail, Fake};
use notify_gate_api::{
    app::{create_app, AppState, Backend},
    config::{
        Config, DatabaseConfig, DeliveryConfig, LoggingConfig, SecurityConfig, SenderProvider,
        ServerConfig, StorageBackend, StorageConfig,
    },
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

/// Test configuration on the in-memory backend.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        delivery: DeliveryConfig {
            provider: SenderProvider::Console,
            email_endpoint: String::new(),
            sms_endpoint: String::new(),
            push_endpoint: String::new(),
            signing_secret: String::new(),
            send_timeout_ms: 2_000,
            stale_pending_secs: 300,
            sweep_interval_secs: 60,
        },
        security: SecurityConfig::default(),
    }
}

/// Build the app with fresh in-memory stores and the given sender.
///
/// Clones of the returned router share the same stores.
pub fn create_test_app(sender: Arc<dyn ChannelSender>) -> Router {
    create_test_app_with_config(test_config(), sender)
}

pub fn create_test_app_with_config(config: Config, sender: Arc<dyn ChannelSender>) -> Router {
    let state = AppState::new(config, Backend::in_memory(), sender);
    create_app(state)
}

/// Build the app on PostgreSQL stores with the given sender.
///
/// Returns `None` when `TEST_DATABASE_URL` is unset.
pub async fn create_postgres_test_app(sender: Arc<dyn ChannelSender>) -> Option<Router> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set, skipping PostgreSQL test");
            return None;
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let mut config = test_config();
    config.storage.backend = StorageBackend::Postgres;
    config.database.url = url;
    let state = AppState::new(config, Backend::postgres(pool), sender);
    Some(create_app(state))
}

/// Build the app with a mock sender that always delivers.
pub fn create_default_app() -> Router {
    create_test_app(Arc::new(MockChannelSender::new()))
}

pub fn unique_user_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4().simple())
}

/// Preference payload with every category and channel enabled.
pub fn preference_payload(user_id: &str) -> Value {
    let email: String = SafeEmail().fake();
    json!({
        "userId": user_id,
        "email": email,
        "preferences": {
            "marketing": true,
            "newsletter": true,
            "updates": true,
            "frequency": "daily",
            "channels": { "email": true, "sms": true, "push": true }
        },
        "timezone": "UTC"
    })
}

pub fn send_payload(user_id: &str, notification_type: &str, channel: &str) -> Value {
    json!({
        "userId": user_id,
        "type": notification_type,
        "channel": channel,
        "content": { "subject": "Hello", "body": "World" }
    })
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a request with a raw, possibly malformed, JSON body.
pub fn raw_json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

/// Create a preference record via the API and return the response body.
pub async fn create_preference(app: &Router, payload: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/preferences", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    parse_response_body(response).await
}

/// Send a notification via the API and return status and body.
pub async fn send_notification(app: &Router, payload: Value) -> (axum::http::StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(Method::POST, "/api/notifications/send", payload))
        .await
        .unwrap();
    let status = response.status();
    (status, parse_response_body(response).await)
}
