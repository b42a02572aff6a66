//! In-memory store implementations.
//!
//! Used when the service runs with `storage.backend = "memory"` and by tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DeliveryLogStore, PreferenceStore, StoreError, StoreResult};
use crate::models::{
    DeliveryLogEntry, DeliveryStatus, DeliveryTransition, UpdatePreferenceRequest, UserPreference,
};

/// Preference records keyed by user id.
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    records: RwLock<HashMap<String, UserPreference>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn create(&self, preference: UserPreference) -> StoreResult<UserPreference> {
        let mut records = self.records.write().await;
        if records.contains_key(&preference.user_id) {
            return Err(StoreError::Conflict(format!(
                "preference for user {}",
                preference.user_id
            )));
        }
        records.insert(preference.user_id.clone(), preference.clone());
        Ok(preference)
    }

    async fn get(&self, user_id: &str) -> StoreResult<Option<UserPreference>> {
        Ok(self.records.read().await.get(user_id).cloned())
    }

    async fn update(
        &self,
        user_id: &str,
        update: &UpdatePreferenceRequest,
    ) -> StoreResult<UserPreference> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("preference for user {}", user_id)))?;
        record.apply_update(update, Utc::now());
        Ok(record.clone())
    }

    async fn delete(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self.records.write().await.remove(user_id).is_some())
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<DeliveryLogEntry>,
    by_id: HashMap<Uuid, usize>,
    by_user: HashMap<String, Vec<usize>>,
}

/// Delivery log entries in insertion order with id and user indexes.
#[derive(Debug, Default)]
pub struct InMemoryDeliveryLogStore {
    state: RwLock<LogState>,
}

impl InMemoryDeliveryLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryLogStore for InMemoryDeliveryLogStore {
    async fn insert(&self, entry: DeliveryLogEntry) -> StoreResult<DeliveryLogEntry> {
        let mut state = self.state.write().await;
        if state.by_id.contains_key(&entry.id) {
            return Err(StoreError::Conflict(format!("delivery log entry {}", entry.id)));
        }

        let index = state.entries.len();
        state.by_id.insert(entry.id, index);
        state
            .by_user
            .entry(entry.user_id.clone())
            .or_default()
            .push(index);
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn complete(
        &self,
        id: Uuid,
        transition: DeliveryTransition,
    ) -> StoreResult<DeliveryLogEntry> {
        let mut state = self.state.write().await;
        let index = *state
            .by_id
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("delivery log entry {}", id)))?;

        let entry = &mut state.entries[index];
        entry
            .apply(transition)
            .map_err(|_| StoreError::NotPending(id))?;
        Ok(entry.clone())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<DeliveryLogEntry>> {
        let state = self.state.read().await;
        Ok(state.by_id.get(&id).map(|&i| state.entries[i].clone()))
    }

    async fn list_by_user(&self, user_id: &str) -> StoreResult<Vec<DeliveryLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .by_user
            .get(user_id)
            .map(|indexes| indexes.iter().map(|&i| state.entries[i].clone()).collect())
            .unwrap_or_default())
    }

    async fn fail_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        reason: &str,
    ) -> StoreResult<u64> {
        let mut state = self.state.write().await;
        let mut failed = 0;
        for entry in state
            .entries
            .iter_mut()
            .filter(|e| e.status == DeliveryStatus::Pending && e.created_at < created_before)
        {
            if entry.apply(DeliveryTransition::failed(reason)).is_ok() {
                failed += 1;
            }
        }
        Ok(failed)
    }
}
