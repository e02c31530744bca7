//! Key/value store trait and in-memory implementation.
//!
//! The trait models the capabilities the cache and activity layers need from
//! their backing store: plain values with an optional TTL, plus bounded-list
//! operations (push-front / trim / range) with per-key atomicity.
//!
//! `MemoryKvStore` is the substitutable in-memory implementation used by
//! tests and single-process deployments.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use storefront_core::{StorageError, StorageResult};

// ============================================================================
// KV STORE TRAIT
// ============================================================================

/// Backing key/value store for the cache and activity layers.
///
/// Implementations must provide atomic per-key operations: two concurrent
/// `list_push_front` calls against one key may interleave in either order but
/// must never corrupt the stored list.
///
/// A value read after its TTL has elapsed is absent, never stale data.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Get a value. Returns None for missing or expired keys.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Set a value, optionally with a TTL after which reads treat it as absent.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StorageResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Push a value to the front of the list stored at `key`, creating the
    /// list if absent.
    async fn list_push_front(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Trim the list stored at `key` to at most `max_len` entries, discarding
    /// from the back. Trimming a missing key is a no-op.
    async fn list_trim(&self, key: &str, max_len: usize) -> StorageResult<()>;

    /// Return up to `limit` entries from the front of the list at `key`.
    async fn list_range(&self, key: &str, limit: usize) -> StorageResult<Vec<Vec<u8>>>;
}

// ============================================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================================

/// A single stored slot: either a plain value or a list.
enum Slot {
    Value {
        bytes: Vec<u8>,
        expires_at: Option<Instant>,
    },
    List(VecDeque<Vec<u8>>),
}

impl Slot {
    fn is_expired(&self, now: Instant) -> bool {
        match self {
            Slot::Value {
                expires_at: Some(deadline),
                ..
            } => now >= *deadline,
            _ => false,
        }
    }
}

/// In-memory key/value store guarded by a single process-wide lock.
///
/// The lock is never held across an await point, so the async trait methods
/// are effectively synchronous map operations.
#[derive(Default)]
pub struct MemoryKvStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys (expired values excluded). Test observability.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.slots
            .read()
            .map(|slots| slots.values().filter(|s| !s.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let slots = self.slots.read().map_err(|_| StorageError::LockPoisoned)?;
            match slots.get(key) {
                None => return Ok(None),
                Some(slot) if slot.is_expired(now) => {}
                Some(Slot::Value { bytes, .. }) => return Ok(Some(bytes.clone())),
                Some(Slot::List(_)) => {
                    return Err(StorageError::backend("key holds a list, not a value"))
                }
            }
        }

        // Expired: reap lazily under the write lock.
        let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
        if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
            slots.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StorageResult<()> {
        let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
        slots.insert(
            key.to_string(),
            Slot::Value {
                bytes: value.to_vec(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
        slots.remove(key);
        Ok(())
    }

    async fn list_push_front(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let now = Instant::now();
        let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
        // An expired value slot is absent; pushing onto it starts a fresh list.
        if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
            slots.remove(key);
        }
        match slots
            .entry(key.to_string())
            .or_insert_with(|| Slot::List(VecDeque::new()))
        {
            Slot::List(items) => {
                items.push_front(value.to_vec());
                Ok(())
            }
            Slot::Value { .. } => Err(StorageError::backend("key holds a value, not a list")),
        }
    }

    async fn list_trim(&self, key: &str, max_len: usize) -> StorageResult<()> {
        let now = Instant::now();
        let mut slots = self.slots.write().map_err(|_| StorageError::LockPoisoned)?;
        if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
            slots.remove(key);
            return Ok(());
        }
        match slots.get_mut(key) {
            None => Ok(()),
            Some(Slot::List(items)) => {
                items.truncate(max_len);
                Ok(())
            }
            Some(Slot::Value { .. }) => {
                Err(StorageError::backend("key holds a value, not a list"))
            }
        }
    }

    async fn list_range(&self, key: &str, limit: usize) -> StorageResult<Vec<Vec<u8>>> {
        let slots = self.slots.read().map_err(|_| StorageError::LockPoisoned)?;
        match slots.get(key) {
            None => Ok(Vec::new()),
            Some(slot) if slot.is_expired(Instant::now()) => Ok(Vec::new()),
            Some(Slot::List(items)) => Ok(items.iter().take(limit).cloned().collect()),
            Some(Slot::Value { .. }) => {
                Err(StorageError::backend("key holds a value, not a list"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", b"v1", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v1".to_vec()));

        store.set("k", b"v2", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v2".to_vec()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);

        // Deleting again is not an error.
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = MemoryKvStore::new();
        store
            .set("k", b"v", Some(Duration::from_millis(40)))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        // Expired entry was reaped.
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_push_trim_range() {
        let store = MemoryKvStore::new();
        assert!(store.list_range("l", 10).await.unwrap().is_empty());
        store.list_trim("l", 3).await.unwrap();

        for i in 0..5u8 {
            store.list_push_front("l", &[i]).await.unwrap();
        }

        // Most-recent-first.
        let all = store.list_range("l", 10).await.unwrap();
        assert_eq!(all, vec![vec![4], vec![3], vec![2], vec![1], vec![0]]);

        let limited = store.list_range("l", 2).await.unwrap();
        assert_eq!(limited, vec![vec![4], vec![3]]);

        store.list_trim("l", 3).await.unwrap();
        let trimmed = store.list_range("l", 10).await.unwrap();
        assert_eq!(trimmed, vec![vec![4], vec![3], vec![2]]);
    }

    #[tokio::test]
    async fn test_expired_value_slot_is_absent_for_list_ops() {
        let store = MemoryKvStore::new();
        store
            .set("k", b"v", Some(Duration::from_millis(30)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Once expired, the slot no longer counts as a value: range and trim
        // see an empty list, and a push starts a fresh one.
        assert!(store.list_range("k", 10).await.unwrap().is_empty());
        store.list_trim("k", 5).await.unwrap();
        store.list_push_front("k", b"first").await.unwrap();
        assert_eq!(
            store.list_range("k", 10).await.unwrap(),
            vec![b"first".to_vec()]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_are_all_retained() {
        let store = std::sync::Arc::new(MemoryKvStore::new());

        let mut handles = Vec::new();
        for i in 0..200u32 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.list_push_front("l", &i.to_be_bytes()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let items = store.list_range("l", usize::MAX).await.unwrap();
        assert_eq!(items.len(), 200);
    }

    #[tokio::test]
    async fn test_kind_mismatch_is_an_error() {
        let store = MemoryKvStore::new();
        store.set("k", b"v", None).await.unwrap();
        assert!(store.list_push_front("k", b"x").await.is_err());
        assert!(store.list_range("k", 1).await.is_err());

        store.list_push_front("l", b"x").await.unwrap();
        assert!(store.get("l").await.is_err());
    }
}
