//! In-memory feedback store for tests and ephemeral deployments
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{merge_status, FeedbackStore, PushKeyGenerator, StoreError};
use crate::types::{now_millis, FeedbackRecord, FeedbackStatus, NewFeedback};

/// Map-backed store keyed by push key.
#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    records: RwLock<BTreeMap<String, FeedbackRecord>>,
    keys: PushKeyGenerator,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records, keyed by their `id`.
    ///
    /// Used to load historical (possibly malformed) data in tests.
    pub fn with_records(records: impl IntoIterator<Item = FeedbackRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.records.write() {
            map.extend(records.into_iter().map(|r| (r.id.clone(), r)));
        }
        store
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn submit(&self, feedback: NewFeedback) -> Result<String, StoreError> {
        let now = now_millis();
        let id = self.keys.generate_at(now);
        let record = feedback.into_record(id.clone(), now);

        let mut map = self
            .records
            .write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        map.insert(id.clone(), record);
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        let map = self
            .records
            .read()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(map.values().cloned().collect())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        let map = self
            .records
            .read()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(map
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<FeedbackRecord>, StoreError> {
        let map = self
            .records
            .read()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(map.get(id).cloned())
    }

    async fn update_status(
        &self,
        id: &str,
        status: FeedbackStatus,
        admin_response: Option<String>,
    ) -> Result<(), StoreError> {
        let mut map = self
            .records
            .write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        let record = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        merge_status(record, status, admin_response, now_millis());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut map = self
            .records
            .write()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        map.remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}
