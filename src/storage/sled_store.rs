//! Sled-backed feedback store
//!
//! Records live in the named tree `{namespace}/feedback`, mirroring the
//! path-addressed layout of the hosted backend (`{namespace}/users` and
//! `{namespace}/news` are siblings this crate never opens).
//!
//! Key: push key bytes (sorts chronologically)
//! Value: camelCase JSON of the record
//!
//! Status updates merge fields at the JSON level so anything the record
//! carries that this crate does not model survives untouched.

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use sled::{Db, Tree};

use super::{FeedbackStore, PushKeyGenerator, StoreError, FEEDBACK_COLLECTION};
use crate::types::{now_millis, FeedbackRecord, FeedbackStatus, NewFeedback};

/// Durable feedback store.
#[derive(Debug)]
pub struct SledFeedbackStore {
    db: Db,
    tree: Tree,
    keys: PushKeyGenerator,
}

impl SledFeedbackStore {
    /// Open or create the store at `path`, using `namespace` as the root of
    /// the key tree.
    pub fn open<P: AsRef<Path>>(path: P, namespace: &str) -> Result<Self, StoreError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(|e| StoreError::Read(e.to_string()))?;
        let tree_name = format!("{namespace}/{FEEDBACK_COLLECTION}");
        let tree = db
            .open_tree(&tree_name)
            .map_err(|e| StoreError::Read(e.to_string()))?;

        tracing::info!(path = ?path_ref, tree = %tree_name, records = tree.len(), "Feedback store opened");

        Ok(Self {
            db,
            tree,
            keys: PushKeyGenerator::new(),
        })
    }

    /// Number of stored records.
    pub fn count(&self) -> usize {
        self.tree.len()
    }

    /// Database size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }

    fn decode(key: &[u8], value: &[u8]) -> Option<FeedbackRecord> {
        let id = String::from_utf8_lossy(key).into_owned();
        match serde_json::from_slice::<FeedbackRecord>(value) {
            Ok(mut record) => {
                record.id = id;
                Some(record)
            }
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "Skipping undecodable feedback record");
                None
            }
        }
    }

    fn scan(&self, mut keep: impl FnMut(&FeedbackRecord) -> bool) -> Result<Vec<FeedbackRecord>, StoreError> {
        let mut records = Vec::new();
        for item in self.tree.iter() {
            let (key, value) = item.map_err(|e| StoreError::Read(e.to_string()))?;
            if let Some(record) = Self::decode(&key, &value) {
                if keep(&record) {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    async fn flush(&self) -> Result<(), StoreError> {
        self.tree
            .flush_async()
            .await
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }
}

/// Merge status fields into a raw stored JSON object.
fn merge_json(
    old: &[u8],
    status: &FeedbackStatus,
    admin_response: Option<&str>,
    now_ms: i64,
) -> Result<Vec<u8>, String> {
    let mut value: Value = serde_json::from_slice(old).map_err(|e| e.to_string())?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| "stored feedback is not a JSON object".to_string())?;

    object.insert("status".to_string(), Value::String(status.as_key().to_string()));
    object.insert("updatedAt".to_string(), Value::from(now_ms));
    if let Some(response) = admin_response {
        object.insert("adminResponse".to_string(), Value::String(response.to_string()));
    }

    serde_json::to_vec(&value).map_err(|e| e.to_string())
}

#[async_trait]
impl FeedbackStore for SledFeedbackStore {
    async fn submit(&self, feedback: NewFeedback) -> Result<String, StoreError> {
        let now = now_millis();
        let id = self.keys.generate_at(now);
        let record = feedback.into_record(id.clone(), now);
        let bytes = serde_json::to_vec(&record).map_err(|e| StoreError::Write(e.to_string()))?;

        self.tree
            .insert(id.as_bytes(), bytes)
            .map_err(|e| StoreError::Write(e.to_string()))?;
        self.flush().await?;

        tracing::debug!(id = %id, category = %record.category, "Stored feedback");
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.scan(|_| true)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<FeedbackRecord>, StoreError> {
        self.scan(|r| r.user_id == user_id)
    }

    async fn get(&self, id: &str) -> Result<Option<FeedbackRecord>, StoreError> {
        let value = self
            .tree
            .get(id.as_bytes())
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(value.and_then(|v| Self::decode(id.as_bytes(), &v)))
    }

    async fn update_status(
        &self,
        id: &str,
        status: FeedbackStatus,
        admin_response: Option<String>,
    ) -> Result<(), StoreError> {
        let now = now_millis();
        let mut merge_error: Option<String> = None;

        // Compare-and-swap loop inside sled; the closure may run more than once.
        let updated = self
            .tree
            .update_and_fetch(id.as_bytes(), |old| {
                let old = old?;
                match merge_json(old, &status, admin_response.as_deref(), now) {
                    Ok(bytes) => {
                        merge_error = None;
                        Some(bytes)
                    }
                    Err(e) => {
                        merge_error = Some(e);
                        Some(old.to_vec())
                    }
                }
            })
            .map_err(|e| StoreError::Write(e.to_string()))?;

        if updated.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        if let Some(e) = merge_error {
            return Err(StoreError::Write(e));
        }
        self.flush().await?;

        tracing::debug!(id = %id, status = %status, "Updated feedback status");
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let removed = self
            .tree
            .remove(id.as_bytes())
            .map_err(|e| StoreError::Write(e.to_string()))?;
        if removed.is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.flush().await?;

        tracing::debug!(id = %id, "Deleted feedback");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
