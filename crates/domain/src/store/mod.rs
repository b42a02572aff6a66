//! Store traits for preference records and delivery logs.
//!
//! Each operation is a single atomic store call. Implementations never hold
//! a lock across an await on anything but their own state.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{DeliveryLogEntry, DeliveryTransition, UpdatePreferenceRequest, UserPreference};

pub use memory::{InMemoryDeliveryLogStore, InMemoryPreferenceStore};

/// Errors reported by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record already exists: {0}")]
    Conflict(String),

    #[error("Delivery log entry {0} is not pending")]
    NotPending(Uuid),

    #[error("Corrupted record: {0}")]
    Corrupted(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One preference record per user.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the user already has one.
    async fn create(&self, preference: UserPreference) -> StoreResult<UserPreference>;

    /// Fetch a user's record. `None` means no preference on file.
    async fn get(&self, user_id: &str) -> StoreResult<Option<UserPreference>>;

    /// Merge the provided fields and bump `last_updated`. Fails with `NotFound` if absent.
    async fn update(
        &self,
        user_id: &str,
        update: &UpdatePreferenceRequest,
    ) -> StoreResult<UserPreference>;

    /// Remove the record. Idempotent: returns whether a record was removed.
    async fn delete(&self, user_id: &str) -> StoreResult<bool>;
}

/// Append-only history of dispatch attempts, indexed by user.
#[async_trait]
pub trait DeliveryLogStore: Send + Sync {
    /// Persist a new entry. Fails with `Conflict` on a duplicate id.
    async fn insert(&self, entry: DeliveryLogEntry) -> StoreResult<DeliveryLogEntry>;

    /// Move a pending entry to its terminal state.
    ///
    /// Fails with `NotPending` if the entry is already terminal and with
    /// `NotFound` if it does not exist.
    async fn complete(
        &self,
        id: Uuid,
        transition: DeliveryTransition,
    ) -> StoreResult<DeliveryLogEntry>;

    async fn find(&self, id: Uuid) -> StoreResult<Option<DeliveryLogEntry>>;

    /// All entries of a user in creation order.
    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<DeliveryLogEntry>>;

    /// Fail every entry still pending that was created before `created_before`.
    async fn fail_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        reason: &str,
    ) -> StoreResult<u64>;
}
