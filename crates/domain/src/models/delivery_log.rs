//! Delivery log models and the per-attempt state machine.
//!
//! A [`DeliveryLogEntry`] is written once in `pending` and moves exactly
//! once to `sent` or `failed`. Terminal entries never change again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::validate_user_id;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::preference::{Channel, NotificationType};

/// Opaque caller-supplied payload carried through unmodified.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Failure reason recorded when the sender raised an unexpected fault.
pub const REASON_SENDER_ERROR: &str = "sender_error";

/// Failure reason recorded when the sender did not answer in time.
pub const REASON_SENDER_TIMEOUT: &str = "sender_timeout";

/// Failure reason recorded by the stale-pending sweep.
pub const REASON_STALE_PENDING: &str = "stale_pending";

/// Status of a single dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
        }
    }

    /// Sent and Failed are terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeliveryStatus::Pending)
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            _ => Err(format!("Unknown delivery status: {}", s)),
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single allowed move out of `pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryTransition {
    Sent { sent_at: DateTime<Utc> },
    Failed { reason: String },
}

impl DeliveryTransition {
    pub fn sent_now() -> Self {
        DeliveryTransition::Sent {
            sent_at: Utc::now(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        DeliveryTransition::Failed {
            reason: reason.into(),
        }
    }

    /// Status the entry ends up in after this transition.
    pub fn target_status(&self) -> DeliveryStatus {
        match self {
            DeliveryTransition::Sent { .. } => DeliveryStatus::Sent,
            DeliveryTransition::Failed { .. } => DeliveryStatus::Failed,
        }
    }
}

/// Attempt to move an entry that is already terminal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Delivery log entry {id} is already {status}")]
pub struct TransitionError {
    pub id: Uuid,
    pub status: DeliveryStatus,
}

/// One dispatch attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub notification_type: NotificationType,
    pub channel: Channel,
    pub status: DeliveryStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl DeliveryLogEntry {
    /// Create a fresh entry in `pending` with a new opaque id.
    pub fn pending(
        user_id: impl Into<String>,
        notification_type: NotificationType,
        channel: Channel,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            notification_type,
            channel,
            status: DeliveryStatus::Pending,
            sent_at: None,
            failure_reason: None,
            metadata,
            created_at: Utc::now(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply the terminal transition. Fails if the entry already left `pending`.
    pub fn apply(&mut self, transition: DeliveryTransition) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError {
                id: self.id,
                status: self.status,
            });
        }

        match transition {
            DeliveryTransition::Sent { sent_at } => {
                self.status = DeliveryStatus::Sent;
                self.sent_at = Some(sent_at);
            }
            DeliveryTransition::Failed { reason } => {
                self.status = DeliveryStatus::Failed;
                self.failure_reason = Some(reason);
            }
        }
        Ok(())
    }
}

/// Request payload for dispatching a notification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendNotificationRequest {
    #[validate(custom(function = "validate_user_id"))]
    pub user_id: String,

    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    pub channel: Channel,

    #[serde(default)]
    pub content: Metadata,
}
