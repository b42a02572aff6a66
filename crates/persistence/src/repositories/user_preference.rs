//! User preference repository.

use async_trait::async_trait;
use domain::models::{UpdatePreferenceRequest, UserPreference};
use domain::store::{PreferenceStore, StoreError, StoreResult};
use sqlx::PgPool;

use crate::entities::UserPreferenceEntity;
use crate::error::map_sqlx_error;
use crate::metrics::QueryTimer;

fn subject(user_id: &str) -> String {
    format!("preference for user {}", user_id)
}

/// Repository for user preference records.
#[derive(Clone)]
pub struct UserPreferenceRepository {
    pool: PgPool,
}

impl UserPreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceStore for UserPreferenceRepository {
    async fn create(&self, preference: UserPreference) -> StoreResult<UserPreference> {
        let settings = &preference.preferences;
        let timer = QueryTimer::new("create_user_preference");
        let result = sqlx::query_as::<_, UserPreferenceEntity>(
            r#"
            INSERT INTO user_preferences (
                user_id, email, marketing, newsletter, updates, frequency,
                channel_email, channel_sms, channel_push, timezone, last_updated, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING user_id, email, marketing, newsletter, updates, frequency,
                      channel_email, channel_sms, channel_push, timezone, last_updated, created_at
            "#,
        )
        .bind(&preference.user_id)
        .bind(&preference.email)
        .bind(settings.marketing)
        .bind(settings.newsletter)
        .bind(settings.updates)
        .bind(settings.frequency.as_str())
        .bind(settings.channels.email)
        .bind(settings.channels.sms)
        .bind(settings.channels.push)
        .bind(&preference.timezone)
        .bind(preference.last_updated)
        .bind(preference.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();

        result
            .map_err(|e| map_sqlx_error(e, &subject(&preference.user_id)))?
            .try_into()
    }

    async fn get(&self, user_id: &str) -> StoreResult<Option<UserPreference>> {
        let timer = QueryTimer::new("get_user_preference");
        let result = sqlx::query_as::<_, UserPreferenceEntity>(
            r#"
            SELECT user_id, email, marketing, newsletter, updates, frequency,
                   channel_email, channel_sms, channel_push, timezone, last_updated, created_at
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(|e| map_sqlx_error(e, &subject(user_id)))?
            .map(UserPreference::try_from)
            .transpose()
    }

    async fn update(
        &self,
        user_id: &str,
        update: &UpdatePreferenceRequest,
    ) -> StoreResult<UserPreference> {
        let patch = update.preferences.clone().unwrap_or_default();
        let channels = patch.channels.unwrap_or_default();

        // Absent fields bind as NULL and keep the stored value.
        let timer = QueryTimer::new("update_user_preference");
        let result = sqlx::query_as::<_, UserPreferenceEntity>(
            r#"
            UPDATE user_preferences
            SET email = COALESCE($2, email),
                marketing = COALESCE($3, marketing),
                newsletter = COALESCE($4, newsletter),
                updates = COALESCE($5, updates),
                frequency = COALESCE($6, frequency),
                channel_email = COALESCE($7, channel_email),
                channel_sms = COALESCE($8, channel_sms),
                channel_push = COALESCE($9, channel_push),
                timezone = COALESCE($10, timezone),
                last_updated = GREATEST(NOW(), created_at)
            WHERE user_id = $1
            RETURNING user_id, email, marketing, newsletter, updates, frequency,
                      channel_email, channel_sms, channel_push, timezone, last_updated, created_at
            "#,
        )
        .bind(user_id)
        .bind(update.email.as_deref())
        .bind(patch.marketing)
        .bind(patch.newsletter)
        .bind(patch.updates)
        .bind(patch.frequency.map(|f| f.as_str()))
        .bind(channels.email)
        .bind(channels.sms)
        .bind(channels.push)
        .bind(update.timezone.as_deref())
        .fetch_optional(&self.pool)
        .await;
        timer.record();

        result
            .map_err(|e| map_sqlx_error(e, &subject(user_id)))?
            .ok_or_else(|| StoreError::NotFound(subject(user_id)))?
            .try_into()
    }

    async fn delete(&self, user_id: &str) -> StoreResult<bool> {
        let timer = QueryTimer::new("delete_user_preference");
        let result = sqlx::query("DELETE FROM user_preferences WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await;
        timer.record();

        let result = result.map_err(|e| map_sqlx_error(e, &subject(user_id)))?;
        Ok(result.rows_affected() > 0)
    }
}
