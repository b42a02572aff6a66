//! Delivery log repository.
//!
//! Entries are only ever inserted and moved out of `pending` once; the
//! terminal write is a conditional update so a late second writer loses.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{DeliveryLogEntry, DeliveryStatus, DeliveryTransition};
use domain::store::{DeliveryLogStore, StoreError, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DeliveryLogEntity;
use crate::error::map_sqlx_error;
use crate::metrics::QueryTimer;

fn subject(id: Uuid) -> String {
    format!("delivery log entry {}", id)
}

/// Repository for delivery log entries.
#[derive(Clone)]
pub struct DeliveryLogRepository {
    pool: PgPool,
}

impl DeliveryLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryLogStore for DeliveryLogRepository {
    async fn insert(&self, entry: DeliveryLogEntry) -> StoreResult<DeliveryLogEntry> {
        let timer = QueryTimer::new("insert_delivery_log");
        let result = sqlx::query_as::<_, DeliveryLogEntity>(
            r#"
            INSERT INTO delivery_logs (
                log_id, user_id, notification_type, channel, status,
                sent_at, failure_reason, metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, log_id, user_id, notification_type, channel, status,
                      sent_at, failure_reason, metadata, created_at
            "#,
        )
        .bind(entry.id)
        .bind(&entry.user_id)
        .bind(entry.notification_type.as_str())
        .bind(entry.channel.as_str())
        .bind(entry.status.as_str())
        .bind(entry.sent_at)
        .bind(entry.failure_reason.as_deref())
        .bind(serde_json::Value::Object(entry.metadata.clone()))
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result
            .map_err(|e| map_sqlx_error(e, &subject(entry.id)))?
            .try_into()
    }

    async fn complete(
        &self,
        id: Uuid,
        transition: DeliveryTransition,
    ) -> StoreResult<DeliveryLogEntry> {
        let (sent_at, failure_reason) = match &transition {
            DeliveryTransition::Sent { sent_at } => (Some(*sent_at), None),
            DeliveryTransition::Failed { reason } => (None, Some(reason.as_str())),
        };

        let timer = QueryTimer::new("complete_delivery_log");
        let result = sqlx::query_as::<_, DeliveryLogEntity>(
            r#"
            UPDATE delivery_logs
            SET status = $2, sent_at = $3, failure_reason = $4
            WHERE log_id = $1 AND status = 'pending'
            RETURNING id, log_id, user_id, notification_type, channel, status,
                      sent_at, failure_reason, metadata, created_at
            "#,
        )
        .bind(id)
        .bind(transition.target_status().as_str())
        .bind(sent_at)
        .bind(failure_reason)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        match result.map_err(|e| map_sqlx_error(e, &subject(id)))? {
            Some(entity) => entity.try_into(),
            None => match self.find(id).await? {
                Some(_) => Err(StoreError::NotPending(id)),
                None => Err(StoreError::NotFound(subject(id))),
            },
        }
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<DeliveryLogEntry>> {
        let timer = QueryTimer::new("find_delivery_log");
        let result = sqlx::query_as::<_, DeliveryLogEntity>(
            r#"
            SELECT id, log_id, user_id, notification_type, channel, status,
                   sent_at, failure_reason, metadata, created_at
            FROM delivery_logs
            WHERE log_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(|e| map_sqlx_error(e, &subject(id)))?
            .map(DeliveryLogEntry::try_from)
            .transpose()
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<DeliveryLogEntry>> {
        let timer = QueryTimer::new("list_delivery_logs_by_user");
        let result = sqlx::query_as::<_, DeliveryLogEntity>(
            r#"
            SELECT id, log_id, user_id, notification_type, channel, status,
                   sent_at, failure_reason, metadata, created_at
            FROM delivery_logs
            WHERE user_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map_err(|e| map_sqlx_error(e, &format!("delivery logs of user {}", user_id)))?
            .into_iter()
            .map(DeliveryLogEntry::try_from)
            .collect()
    }

    async fn fail_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        reason: &str,
    ) -> StoreResult<u64> {
        let timer = QueryTimer::new("fail_stale_pending_delivery_logs");
        let result = sqlx::query(
            r#"
            UPDATE delivery_logs
            SET status = $1, failure_reason = $2
            WHERE status = 'pending' AND created_at < $3
            "#,
        )
        .bind(DeliveryStatus::Failed.as_str())
        .bind(reason)
        .bind(created_before)
        .execute(&self.pool)
        .await;
        timer.record();

        let result = result.map_err(|e| map_sqlx_error(e, "stale pending delivery logs"))?;
        Ok(result.rows_affected())
    }
}
