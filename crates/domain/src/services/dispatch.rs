//! Dispatch engine.
//!
//! Orchestrates one notification request:
//! 1. Reads a snapshot of the user's preference (read once, never re-read)
//! 2. Applies the decision function
//! 3. On allow, persists a `pending` log entry
//! 4. Hands the message to the channel sender
//! 5. Persists the single terminal transition (`sent` or `failed`)
//!
//! Steps 4 and 5 run on their own task so the terminal write still happens
//! when the caller goes away mid-send. No store lock is held while the
//! sender runs.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::channel_sender::{ChannelSender, OutboundMessage, SendOutcome};
use super::decision::{decide, Decision, DenyReason};
use crate::models::delivery_log::{REASON_SENDER_ERROR, REASON_SENDER_TIMEOUT, REASON_STALE_PENDING};
use crate::models::{Channel, DeliveryLogEntry, DeliveryTransition, Metadata, NotificationType};
use crate::store::{DeliveryLogStore, PreferenceStore, StoreError};

/// Default time a channel sender gets before the attempt is failed.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Attempts made to persist the terminal transition.
const TERMINAL_WRITE_ATTEMPTS: usize = 3;

/// Backoff before each terminal-write retry, in milliseconds.
const TERMINAL_WRITE_BACKOFF_MS: [u64; 2] = [50, 250];

/// Total backoff the terminal write may spend between attempts.
pub const TERMINAL_WRITE_BUDGET: Duration =
    Duration::from_millis(TERMINAL_WRITE_BACKOFF_MS[0] + TERMINAL_WRITE_BACKOFF_MS[1]);

/// Youngest age at which a pending entry can no longer have a send in flight.
///
/// Sweeping anything younger could overwrite the outcome the sender is
/// about to report.
pub fn min_stale_pending_age(send_timeout: Duration) -> Duration {
    send_timeout + TERMINAL_WRITE_BUDGET
}

/// Errors that can occur during dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch completion interrupted: {0}")]
    Interrupted(String),
}

/// Result of a dispatch that the decision function refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeniedResult {
    pub user_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub channel: Channel,
    pub reason: DenyReason,
}

/// Outcome of [`DispatchEngine::dispatch`].
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// The send was attempted; the entry is terminal.
    Attempted(DeliveryLogEntry),
    /// Policy refused the send; nothing was persisted.
    Denied(DeniedResult),
}

/// Preference-gated dispatch engine.
#[derive(Clone)]
pub struct DispatchEngine {
    preferences: Arc<dyn PreferenceStore>,
    logs: Arc<dyn DeliveryLogStore>,
    sender: Arc<dyn ChannelSender>,
    send_timeout: Duration,
}

impl DispatchEngine {
    /// Create an engine from its three collaborators.
    pub fn new(
        preferences: Arc<dyn PreferenceStore>,
        logs: Arc<dyn DeliveryLogStore>,
        sender: Arc<dyn ChannelSender>,
    ) -> Self {
        Self {
            preferences,
            logs,
            sender,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the channel sender timeout.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Dispatch one notification.
    ///
    /// Denied requests are side-effect free. Allowed requests always end in
    /// exactly one terminal log entry; sender failures, faults and timeouts
    /// become `failed` entries rather than errors. Only store faults surface
    /// as [`DispatchError`].
    pub async fn dispatch(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        channel: Channel,
        content: Metadata,
    ) -> Result<DispatchOutcome, DispatchError> {
        let snapshot = self.preferences.get(user_id).await?;

        let decision = decide(snapshot.as_ref(), notification_type, channel);
        let preference = match (decision, snapshot) {
            (Decision::Allow, Some(preference)) => preference,
            (Decision::Deny(reason), _) => {
                return Ok(Self::denied(user_id, notification_type, channel, reason))
            }
            (Decision::Allow, None) => {
                return Ok(Self::denied(
                    user_id,
                    notification_type,
                    channel,
                    DenyReason::NoPreferenceOnFile,
                ))
            }
        };

        let entry = self
            .logs
            .insert(DeliveryLogEntry::pending(
                user_id,
                notification_type,
                channel,
                content,
            ))
            .await?;

        debug!(
            log_id = %entry.id,
            user_id = %user_id,
            channel = %channel,
            "Delivery log entry created in pending"
        );

        let message = OutboundMessage {
            log_id: entry.id,
            user_id: entry.user_id.clone(),
            email: preference.email,
            notification_type,
            channel,
            content: entry.metadata.clone(),
        };

        let completion = tokio::spawn(Self::complete(
            Arc::clone(&self.logs),
            Arc::clone(&self.sender),
            self.send_timeout,
            message,
        ));

        let terminal = completion
            .await
            .map_err(|e| DispatchError::Interrupted(e.to_string()))??;

        Ok(DispatchOutcome::Attempted(terminal))
    }

    /// All delivery log entries of a user in creation order.
    pub async fn list_logs(&self, user_id: &str) -> Result<Vec<DeliveryLogEntry>, DispatchError> {
        Ok(self.logs.list_by_user(user_id).await?)
    }

    /// Fail entries left pending for longer than `max_age`.
    ///
    /// `max_age` is raised to [`min_stale_pending_age`] of this engine's send
    /// timeout, so entries whose send may still be running are left alone.
    pub async fn fail_stale_pending(&self, max_age: Duration) -> Result<u64, DispatchError> {
        let max_age = max_age.max(min_stale_pending_age(self.send_timeout));
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| DispatchError::Interrupted(e.to_string()))?;
        let cutoff = Utc::now() - max_age;
        let failed = self
            .logs
            .fail_stale_pending(cutoff, REASON_STALE_PENDING)
            .await?;

        if failed > 0 {
            warn!(failed = failed, "Failed stale pending delivery log entries");
        }
        Ok(failed)
    }

    fn denied(
        user_id: &str,
        notification_type: NotificationType,
        channel: Channel,
        reason: DenyReason,
    ) -> DispatchOutcome {
        info!(
            user_id = %user_id,
            notification_type = %notification_type,
            channel = %channel,
            reason = %reason,
            "Notification denied by preferences"
        );
        DispatchOutcome::Denied(DeniedResult {
            user_id: user_id.to_string(),
            notification_type,
            channel,
            reason,
        })
    }

    /// Run the sender and persist the terminal transition.
    async fn complete(
        logs: Arc<dyn DeliveryLogStore>,
        sender: Arc<dyn ChannelSender>,
        send_timeout: Duration,
        message: OutboundMessage,
    ) -> Result<DeliveryLogEntry, StoreError> {
        let log_id = message.log_id;
        let transition = Self::attempt_send(sender, send_timeout, message).await;
        Self::persist_transition(logs.as_ref(), log_id, transition).await
    }

    /// Call the sender and map every possible result to a transition.
    async fn attempt_send(
        sender: Arc<dyn ChannelSender>,
        send_timeout: Duration,
        message: OutboundMessage,
    ) -> DeliveryTransition {
        let log_id = message.log_id;
        let mut handle = tokio::spawn(async move { sender.send(&message).await });

        match tokio::time::timeout(send_timeout, &mut handle).await {
            Ok(Ok(Ok(SendOutcome::Delivered))) => DeliveryTransition::sent_now(),
            Ok(Ok(Ok(SendOutcome::Failed(reason)))) => {
                warn!(log_id = %log_id, reason = %reason, "Channel sender reported failure");
                DeliveryTransition::failed(reason)
            }
            Ok(Ok(Err(e))) => {
                warn!(log_id = %log_id, error = %e, "Channel sender fault");
                DeliveryTransition::failed(REASON_SENDER_ERROR)
            }
            Ok(Err(e)) => {
                error!(log_id = %log_id, error = %e, "Channel sender task crashed");
                DeliveryTransition::failed(REASON_SENDER_ERROR)
            }
            Err(_) => {
                handle.abort();
                warn!(
                    log_id = %log_id,
                    timeout_ms = send_timeout.as_millis() as u64,
                    "Channel sender timed out"
                );
                DeliveryTransition::failed(REASON_SENDER_TIMEOUT)
            }
        }
    }

    /// Persist the terminal transition, retrying transient store faults.
    ///
    /// If another writer (the stale sweep) already finished the entry, the
    /// stored terminal entry is returned as-is.
    async fn persist_transition(
        logs: &dyn DeliveryLogStore,
        log_id: Uuid,
        transition: DeliveryTransition,
    ) -> Result<DeliveryLogEntry, StoreError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match logs.complete(log_id, transition.clone()).await {
                Ok(entry) => {
                    info!(
                        log_id = %log_id,
                        status = %entry.status,
                        failure_reason = entry.failure_reason.as_deref().unwrap_or(""),
                        "Delivery log entry reached terminal state"
                    );
                    return Ok(entry);
                }
                Err(StoreError::NotPending(_)) => {
                    warn!(log_id = %log_id, "Delivery log entry already terminal");
                    return logs
                        .find(log_id)
                        .await?
                        .ok_or_else(|| StoreError::NotFound(format!("delivery log entry {}", log_id)));
                }
                Err(StoreError::Unavailable(e)) if attempt < TERMINAL_WRITE_ATTEMPTS => {
                    let backoff = TERMINAL_WRITE_BACKOFF_MS[attempt - 1];
                    warn!(
                        log_id = %log_id,
                        attempt = attempt,
                        backoff_ms = backoff,
                        error = %e,
                        "Terminal write failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    error!(
                        log_id = %log_id,
                        attempt = attempt,
                        error = %e,
                        "Terminal write failed, leaving entry to the stale sweep"
                    );
                    return Err(e);
                }
            }
        }
    }
}
