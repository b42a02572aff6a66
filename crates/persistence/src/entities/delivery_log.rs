//! Delivery log entity.
//!
//! Maps to the delivery_logs table. `id` is the insertion sequence used for
//! ordering; `log_id` is the public identifier.

use chrono::{DateTime, Utc};
use domain::models::{Channel, DeliveryLogEntry, DeliveryStatus, NotificationType};
use domain::store::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database entity for delivery_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryLogEntity {
    pub id: i64,
    pub log_id: Uuid,
    pub user_id: String,
    pub notification_type: String,
    pub channel: String,
    pub status: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DeliveryLogEntity> for DeliveryLogEntry {
    type Error = StoreError;

    fn try_from(entity: DeliveryLogEntity) -> Result<Self, Self::Error> {
        let log_id = entity.log_id;
        let corrupted =
            move |e: String| StoreError::Corrupted(format!("delivery log entry {}: {}", log_id, e));

        let notification_type = entity
            .notification_type
            .parse::<NotificationType>()
            .map_err(corrupted)?;
        let channel = entity.channel.parse::<Channel>().map_err(corrupted)?;
        let status = entity.status.parse::<DeliveryStatus>().map_err(corrupted)?;
        let metadata = match entity.metadata {
            serde_json::Value::Object(map) => map,
            other => return Err(corrupted(format!("metadata is not an object: {}", other))),
        };

        Ok(DeliveryLogEntry {
            id: entity.log_id,
            user_id: entity.user_id,
            notification_type,
            channel,
            status,
            sent_at: entity.sent_at,
            failure_reason: entity.failure_reason,
            metadata,
            created_at: entity.created_at,
        })
    }
}
