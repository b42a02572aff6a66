//! Common test utilities for repository integration tests.
//!
//! These tests need a PostgreSQL database. Point `TEST_DATABASE_URL` at one
//! to run them; without it every test returns early.

#![allow(dead_code)]

use chrono::{SubsecRound, Utc};
use domain::models::{
    Channel, ChannelSettings, DeliveryLogEntry, Frequency, Metadata, NotificationSettings,
    NotificationType, UserPreference,
};
use fake::{faker::internet::en::SafeEmail, Fake};
use persistence::db::run_migrations;
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connect to the test database and apply migrations.
///
/// Returns `None` when `TEST_DATABASE_URL` is unset.
pub async fn create_test_pool() -> Option<PgPool> {
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
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Some(pool)
}

pub fn unique_user_id() -> String {
    format!("user-{}", uuid::Uuid::new_v4().simple())
}

/// Preference record with every category and channel enabled.
///
/// Timestamps are truncated to the microsecond precision the database keeps.
pub fn test_preference(user_id: &str) -> UserPreference {
    let now = Utc::now().trunc_subsecs(6);
    UserPreference {
        user_id: user_id.to_string(),
        email: SafeEmail().fake(),
        preferences: NotificationSettings {
            marketing: true,
            newsletter: true,
            updates: true,
            frequency: Frequency::Daily,
            channels: ChannelSettings {
                email: true,
                sms: true,
                push: true,
            },
        },
        timezone: "UTC".to_string(),
        last_updated: now,
        created_at: now,
    }
}

pub fn test_metadata() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("subject".to_string(), json!("Hello"));
    metadata.insert("body".to_string(), json!({ "text": "World", "lines": [1, 2] }));
    metadata
}

pub fn pending_entry(user_id: &str) -> DeliveryLogEntry {
    let mut entry = DeliveryLogEntry::pending(
        user_id,
        NotificationType::Marketing,
        Channel::Email,
        test_metadata(),
    );
    entry.created_at = entry.created_at.trunc_subsecs(6);
    entry
}
