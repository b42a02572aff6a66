//! Channel sender capability.
//!
//! The dispatch engine hands each allowed notification to a [`ChannelSender`]
//! and records whatever it reports. Transport details (SMTP, SMS gateways,
//! push providers) live behind this trait.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Channel, Metadata, NotificationType};

/// Message handed to a channel sender.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub log_id: Uuid,
    pub user_id: String,
    pub email: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub channel: Channel,
    pub content: Metadata,
}

/// Structured result of a send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The provider accepted the message.
    Delivered,
    /// The provider refused the message; the reason is recorded verbatim.
    Failed(String),
}

/// Unexpected fault raised by a sender (not a structured refusal).
#[derive(Debug, Error)]
pub enum SenderError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Sender misconfigured: {0}")]
    Misconfigured(String),
}

/// Capability that performs the transport-level send.
#[async_trait::async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<SendOutcome, SenderError>;
}

/// Behaviour of the [`MockChannelSender`].
#[derive(Debug, Clone, Default)]
pub enum MockBehavior {
    #[default]
    Succeed,
    Fail(String),
    Fault(String),
    Panic,
}

/// Mock channel sender for development and testing.
///
/// Logs messages but doesn't actually send them. Clones share the call counter.
#[derive(Debug, Clone, Default)]
pub struct MockChannelSender {
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockChannelSender {
    /// Create a mock sender that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sender that refuses every message with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            behavior: MockBehavior::Fail(reason.into()),
            ..Self::default()
        }
    }

    /// Create a mock sender that raises a transport fault.
    pub fn faulting() -> Self {
        Self {
            behavior: MockBehavior::Fault("connection reset".to_string()),
            ..Self::default()
        }
    }

    /// Create a mock sender that panics mid-send.
    pub fn panicking() -> Self {
        Self {
            behavior: MockBehavior::Panic,
            ..Self::default()
        }
    }

    /// Sleep for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of messages this sender (and its clones) received.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ChannelSender for MockChannelSender {
    async fn send(&self, message: &OutboundMessage) -> Result<SendOutcome, SenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Succeed => {
                tracing::info!(
                    log_id = %message.log_id,
                    user_id = %message.user_id,
                    channel = %message.channel,
                    notification_type = %message.notification_type,
                    "Mock: Would send notification"
                );
                Ok(SendOutcome::Delivered)
            }
            MockBehavior::Fail(reason) => {
                tracing::warn!(
                    log_id = %message.log_id,
                    reason = %reason,
                    "Mock channel sender simulating failure"
                );
                Ok(SendOutcome::Failed(reason.clone()))
            }
            MockBehavior::Fault(detail) => Err(SenderError::Transport(detail.clone())),
            MockBehavior::Panic => panic!("mock channel sender panicked"),
        }
    }
}
