//! Bounded per-actor activity log.
//!
//! Records live in the same key/value store as the admin cache, one list per
//! actor under `storefront:activity:<actor_id>`, most-recent-first, trimmed
//! to [`MAX_ACTIVITY_RECORDS`].
//!
//! Logging is strictly best-effort: `record` never fails the operation it is
//! recording, and `recent` returns an empty window when the backing store is
//! unreachable.

use std::sync::Arc;

use storefront_core::ActivityRecord;

use crate::cache::CACHE_NAMESPACE;
use crate::kv::KvStore;

/// Maximum records retained per actor.
pub const MAX_ACTIVITY_RECORDS: usize = 100;

/// Default read window for [`ActivityLog::recent`].
pub const DEFAULT_RECENT_LIMIT: usize = 20;

/// Storage key for an actor's activity list.
pub fn activity_key(actor_id: &str) -> String {
    format!("{CACHE_NAMESPACE}:activity:{actor_id}")
}

/// Bounded activity log over a key/value backend.
pub struct ActivityLog<S: KvStore> {
    store: Arc<S>,
}

impl<S: KvStore> Clone for ActivityLog<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore> ActivityLog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Append a timestamped record to the front of the actor's sequence and
    /// trim to the retention bound. Failures are logged and swallowed.
    pub async fn record(&self, actor_id: &str, action: &str, detail: Option<String>) {
        let record = ActivityRecord::now(actor_id, action, detail);
        let bytes = match serde_json::to_vec(&record) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(actor_id, action, error = %err, "activity record failed to serialize, dropping");
                return;
            }
        };

        let key = activity_key(actor_id);
        if let Err(err) = self.store.list_push_front(&key, &bytes).await {
            tracing::warn!(actor_id, action, error = %err, "activity record failed, dropping");
            return;
        }
        if let Err(err) = self.store.list_trim(&key, MAX_ACTIVITY_RECORDS).await {
            tracing::warn!(actor_id, error = %err, "activity trim failed");
        }
    }

    /// Return up to `limit` most-recent records, most-recent-first. Returns
    /// an empty window on backing-store failure.
    pub async fn recent(&self, actor_id: &str, limit: usize) -> Vec<ActivityRecord> {
        let key = activity_key(actor_id);
        let entries = match self.store.list_range(&key, limit).await {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(actor_id, error = %err, "activity read failed, returning empty window");
                return Vec::new();
            }
        };

        entries
            .iter()
            .filter_map(|bytes| match serde_json::from_slice(bytes) {
                Ok(record) => Some(record),
                Err(err) => {
                    tracing::warn!(actor_id, error = %err, "skipping undecodable activity record");
                    None
                }
            })
            .collect()
    }
}
