//! User notification preference models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_timezone, validate_user_id};
use std::str::FromStr;
use validator::Validate;

/// Notification category a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Marketing,
    Newsletter,
    Updates,
}

impl NotificationType {
    pub const ALL: [NotificationType; 3] = [
        NotificationType::Marketing,
        NotificationType::Newsletter,
        NotificationType::Updates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Marketing => "marketing",
            NotificationType::Newsletter => "newsletter",
            NotificationType::Updates => "updates",
        }
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "marketing" => Ok(NotificationType::Marketing),
            "newsletter" => Ok(NotificationType::Newsletter),
            "updates" => Ok(NotificationType::Updates),
            _ => Err(format!("Unknown notification type: {}", s)),
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Sms,
    Push,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Sms, Channel::Push];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
            Channel::Push => "push",
        }
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "sms" => Ok(Channel::Sms),
            "push" => Ok(Channel::Push),
            _ => Err(format!("Unknown channel: {}", s)),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often a user agrees to be contacted. `Never` is a global kill-switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Never,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Never => "never",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "never" => Ok(Frequency::Never),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-channel opt-in flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChannelSettings {
    pub email: bool,
    pub sms: bool,
    pub push: bool,
}

impl ChannelSettings {
    /// Whether the user accepts messages on the given channel.
    pub fn allows(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email,
            Channel::Sms => self.sms,
            Channel::Push => self.push,
        }
    }
}

/// Category, frequency and channel settings of a preference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationSettings {
    pub marketing: bool,
    pub newsletter: bool,
    pub updates: bool,
    pub frequency: Frequency,
    pub channels: ChannelSettings,
}

impl NotificationSettings {
    /// Whether the user opted in to the given category.
    pub fn is_opted_in(&self, notification_type: NotificationType) -> bool {
        match notification_type {
            NotificationType::Marketing => self.marketing,
            NotificationType::Newsletter => self.newsletter,
            NotificationType::Updates => self.updates,
        }
    }
}

/// Stored preference record, one per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreference {
    pub user_id: String,
    pub email: String,
    pub preferences: NotificationSettings,
    pub timezone: String,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserPreference {
    /// Build a new record from a validated create request.
    pub fn from_request(request: CreatePreferenceRequest, now: DateTime<Utc>) -> Self {
        Self {
            user_id: request.user_id,
            email: request.email,
            preferences: request.preferences,
            timezone: request.timezone,
            last_updated: now,
            created_at: now,
        }
    }

    /// Merge the provided fields into this record and bump `last_updated`.
    ///
    /// `user_id` and `created_at` never change. `last_updated` never moves
    /// behind `created_at`, even with a skewed clock.
    pub fn apply_update(&mut self, update: &UpdatePreferenceRequest, now: DateTime<Utc>) {
        if let Some(ref email) = update.email {
            self.email = email.clone();
        }
        if let Some(ref timezone) = update.timezone {
            self.timezone = timezone.clone();
        }
        if let Some(ref patch) = update.preferences {
            let settings = &mut self.preferences;
            if let Some(marketing) = patch.marketing {
                settings.marketing = marketing;
            }
            if let Some(newsletter) = patch.newsletter {
                settings.newsletter = newsletter;
            }
            if let Some(updates) = patch.updates {
                settings.updates = updates;
            }
            if let Some(frequency) = patch.frequency {
                settings.frequency = frequency;
            }
            if let Some(ref channels) = patch.channels {
                if let Some(email) = channels.email {
                    settings.channels.email = email;
                }
                if let Some(sms) = channels.sms {
                    settings.channels.sms = sms;
                }
                if let Some(push) = channels.push {
                    settings.channels.push = push;
                }
            }
        }
        self.last_updated = now.max(self.created_at);
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

/// Request payload for creating a preference record.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePreferenceRequest {
    #[validate(custom(function = "validate_user_id"))]
    pub user_id: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub preferences: NotificationSettings,

    #[serde(default = "default_timezone")]
    #[validate(custom(function = "validate_timezone"))]
    pub timezone: String,
}

/// Partial channel settings for updates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChannelSettingsPatch {
    pub email: Option<bool>,
    pub sms: Option<bool>,
    pub push: Option<bool>,
}

/// Partial notification settings for updates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NotificationSettingsPatch {
    pub marketing: Option<bool>,
    pub newsletter: Option<bool>,
    pub updates: Option<bool>,
    pub frequency: Option<Frequency>,
    pub channels: Option<ChannelSettingsPatch>,
}

/// Request payload for updating a preference record (partial update).
///
/// `userId` is not accepted: the identifier is immutable after creation.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePreferenceRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub preferences: Option<NotificationSettingsPatch>,

    #[validate(custom(function = "validate_timezone"))]
    pub timezone: Option<String>,
}

/// Response for deleting a preference record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePreferenceResponse {
    pub message: String,
    pub deleted: bool,
}
