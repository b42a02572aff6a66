//! User preference entity.
//!
//! Maps to the user_preferences table. Notification settings are stored as
//! flat columns and folded back into the nested domain shape on read.

use chrono::{DateTime, Utc};
use domain::models::{ChannelSettings, Frequency, NotificationSettings, UserPreference};
use domain::store::StoreError;
use sqlx::FromRow;

/// Database entity for user_preferences table.
#[derive(Debug, Clone, FromRow)]
pub struct UserPreferenceEntity {
    pub user_id: String,
    pub email: String,
    pub marketing: bool,
    pub newsletter: bool,
    pub updates: bool,
    pub frequency: String,
    pub channel_email: bool,
    pub channel_sms: bool,
    pub channel_push: bool,
    pub timezone: String,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserPreferenceEntity> for UserPreference {
    type Error = StoreError;

    fn try_from(entity: UserPreferenceEntity) -> Result<Self, Self::Error> {
        let frequency = entity.frequency.parse::<Frequency>().map_err(|e| {
            StoreError::Corrupted(format!("preference for user {}: {}", entity.user_id, e))
        })?;

        Ok(UserPreference {
            user_id: entity.user_id,
            email: entity.email,
            preferences: NotificationSettings {
                marketing: entity.marketing,
                newsletter: entity.newsletter,
                updates: entity.updates,
                frequency,
                channels: ChannelSettings {
                    email: entity.channel_email,
                    sms: entity.channel_sms,
                    push: entity.channel_push,
                },
            },
            timezone: entity.timezone,
            last_updated: entity.last_updated,
            created_at: entity.created_at,
        })
    }
}
