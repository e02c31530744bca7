//! LMDB-backed key/value store.
//!
//! Uses the heed crate (Rust bindings for LMDB) to provide a persistent,
//! memory-mapped backing store for the admin cache and activity log.
//!
//! # Atomicity
//!
//! LMDB allows a single write transaction at a time per environment. Every
//! mutation here (set, delete, push, trim) runs inside one write
//! transaction, including its reads: a push re-reads the list through the
//! write transaction it commits under, so concurrent pushes to one actor's
//! list serialize and never lose an entry.
//!
//! # Expiry
//!
//! Values are framed with an optional absolute expiry (unix milliseconds).
//! An expired value is treated as absent on read and reaped lazily; the
//! reap re-checks the key under its write transaction so a value written
//! concurrently is never evicted while fresh.

use std::path::Path;

use async_trait::async_trait;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storefront_core::{StorageError, StorageResult};

/// Error type for opening the LMDB store.
#[derive(Debug, thiserror::Error)]
pub enum LmdbKvError {
    /// Failed to open or create the LMDB environment.
    #[error("Failed to open LMDB environment: {0}")]
    EnvOpen(String),

    /// Failed to open the database within the environment.
    #[error("Failed to open database: {0}")]
    DbOpen(String),

    /// Transaction error.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk value framing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Stored {
    Value {
        expires_at_ms: Option<i64>,
        payload: Vec<u8>,
    },
    List {
        items: Vec<Vec<u8>>,
    },
}

impl Stored {
    fn is_expired(&self, now_ms: i64) -> bool {
        matches!(
            self,
            Stored::Value {
                expires_at_ms: Some(deadline),
                ..
            } if now_ms >= *deadline
        )
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Interpret a slot as a list: absent and expired slots are an empty list,
/// a live plain value is a kind mismatch.
fn live_list(stored: Option<Stored>) -> StorageResult<Vec<Vec<u8>>> {
    match stored {
        None => Ok(Vec::new()),
        Some(stored) if stored.is_expired(now_ms()) => Ok(Vec::new()),
        Some(Stored::List { items }) => Ok(items),
        Some(Stored::Value { .. }) => Err(StorageError::backend("key holds a value, not a list")),
    }
}

/// LMDB-backed implementation of [`KvStore`](crate::kv::KvStore).
pub struct LmdbKvStore {
    /// The LMDB environment.
    env: Env,
    /// The main database (single unnamed database).
    db: Database<Str, Bytes>,
}

impl LmdbKvStore {
    /// Open (or create) an LMDB store at `path` with the given map size.
    pub fn new<P: AsRef<Path>>(path: P, max_size_mb: usize) -> Result<Self, LmdbKvError> {
        std::fs::create_dir_all(&path)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(max_size_mb * 1024 * 1024)
                .max_dbs(1)
                .open(path.as_ref())
        }
        .map_err(|e| LmdbKvError::EnvOpen(e.to_string()))?;

        let mut wtxn = env
            .write_txn()
            .map_err(|e| LmdbKvError::Transaction(e.to_string()))?;

        let db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, None)
            .map_err(|e| LmdbKvError::DbOpen(e.to_string()))?;

        wtxn.commit()
            .map_err(|e| LmdbKvError::Transaction(e.to_string()))?;

        Ok(Self { env, db })
    }

    fn decode(key: &str, bytes: &[u8]) -> StorageResult<Stored> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::serialization(key, e.to_string()))
    }

    fn encode(key: &str, stored: &Stored) -> StorageResult<Vec<u8>> {
        serde_json::to_vec(stored).map_err(|e| StorageError::serialization(key, e.to_string()))
    }

    fn read(&self, key: &str) -> StorageResult<Option<Stored>> {
        let rtxn = self
            .env
            .read_txn()
            .map_err(|e| StorageError::backend(e.to_string()))?;
        let bytes = self
            .db
            .get(&rtxn, key)
            .map_err(|e| StorageError::backend(e.to_string()))?;
        match bytes {
            None => Ok(None),
            Some(bytes) => Self::decode(key, bytes).map(Some),
        }
    }

    fn write(&self, key: &str, stored: &Stored) -> StorageResult<()> {
        let bytes = Self::encode(key, stored)?;
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::backend(e.to_string()))?;
        self.db
            .put(&mut wtxn, key, &bytes)
            .map_err(|e| StorageError::backend(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::backend(e.to_string()))?;
        self.db
            .delete(&mut wtxn, key)
            .map_err(|e| StorageError::backend(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    /// Delete `key` only if it still holds an expired value.
    ///
    /// The key is re-read under the write transaction: a concurrent writer
    /// may have replaced the value since the expired read, and a fresh value
    /// must not be evicted inside its TTL.
    fn reap_if_expired(&self, key: &str) -> StorageResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::backend(e.to_string()))?;
        let stored = match self
            .db
            .get(&wtxn, key)
            .map_err(|e| StorageError::backend(e.to_string()))?
        {
            None => return Ok(()),
            Some(bytes) => Self::decode(key, bytes)?,
        };
        if stored.is_expired(now_ms()) {
            self.db
                .delete(&mut wtxn, key)
                .map_err(|e| StorageError::backend(e.to_string()))?;
            wtxn.commit()
                .map_err(|e| StorageError::backend(e.to_string()))?;
        }
        Ok(())
    }
}

#[async_trait]
impl crate::kv::KvStore for LmdbKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match self.read(key)? {
            None => Ok(None),
            Some(stored) if stored.is_expired(now_ms()) => {
                self.reap_if_expired(key)?;
                Ok(None)
            }
            Some(Stored::Value { payload, .. }) => Ok(Some(payload)),
            Some(Stored::List { .. }) => {
                Err(StorageError::backend("key holds a list, not a value"))
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> StorageResult<()> {
        let stored = Stored::Value {
            expires_at_ms: ttl.map(|ttl| now_ms() + ttl.as_millis() as i64),
            payload: value.to_vec(),
        };
        self.write(key, &stored)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.remove(key)
    }

    async fn list_push_front(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::backend(e.to_string()))?;
        let stored = match self
            .db
            .get(&wtxn, key)
            .map_err(|e| StorageError::backend(e.to_string()))?
        {
            None => None,
            Some(bytes) => Some(Self::decode(key, bytes)?),
        };

        let mut items = live_list(stored)?;
        items.insert(0, value.to_vec());

        let bytes = Self::encode(key, &Stored::List { items })?;
        self.db
            .put(&mut wtxn, key, &bytes)
            .map_err(|e| StorageError::backend(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn list_trim(&self, key: &str, max_len: usize) -> StorageResult<()> {
        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StorageError::backend(e.to_string()))?;
        let stored = match self
            .db
            .get(&wtxn, key)
            .map_err(|e| StorageError::backend(e.to_string()))?
        {
            None => None,
            Some(bytes) => Some(Self::decode(key, bytes)?),
        };

        let mut items = live_list(stored)?;
        if items.len() <= max_len {
            // Nothing to trim; dropping the transaction aborts it.
            return Ok(());
        }
        items.truncate(max_len);

        let bytes = Self::encode(key, &Stored::List { items })?;
        self.db
            .put(&mut wtxn, key, &bytes)
            .map_err(|e| StorageError::backend(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| StorageError::backend(e.to_string()))
    }

    async fn list_range(&self, key: &str, limit: usize) -> StorageResult<Vec<Vec<u8>>> {
        let items = live_list(self.read(key)?)?;
        Ok(items.into_iter().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvStore;
    use std::sync::Arc;

    fn temp_store() -> (tempfile::TempDir, LmdbKvStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LmdbKvStore::new(dir.path(), 16).expect("open lmdb");
        (dir, store)
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", b"v1", None).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v1".to_vec()));

        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        store.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let (_dir, store) = temp_store();
        store
            .set("k", b"v", Some(Duration::from_millis(40)))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reap_only_deletes_expired_values() {
        let (_dir, store) = temp_store();

        // A fresh value survives a reap attempt.
        store.set("k", b"fresh", None).await.unwrap();
        store.reap_if_expired("k").unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"fresh".to_vec()));

        // An expired value is removed.
        store
            .set("k", b"old", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        store.reap_if_expired("k").unwrap();
        assert!(store.read("k").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_operations() {
        let (_dir, store) = temp_store();

        for i in 0..5u8 {
            store.list_push_front("l", &[i]).await.unwrap();
        }
        let all = store.list_range("l", 10).await.unwrap();
        assert_eq!(all, vec![vec![4], vec![3], vec![2], vec![1], vec![0]]);

        store.list_trim("l", 2).await.unwrap();
        let trimmed = store.list_range("l", 10).await.unwrap();
        assert_eq!(trimmed, vec![vec![4], vec![3]]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_are_all_retained() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(LmdbKvStore::new(dir.path(), 16).expect("open lmdb"));

        let mut handles = Vec::new();
        for i in 0..200u32 {
            let store = Arc::clone(&store);
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
    async fn test_expired_value_slot_is_absent_for_list_ops() {
        let (_dir, store) = temp_store();
        store
            .set("k", b"v", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        // Expired slot reads as an empty list, and a push starts fresh.
        assert!(store.list_range("k", 10).await.unwrap().is_empty());
        store.list_trim("k", 5).await.unwrap();
        store.list_push_front("k", b"first").await.unwrap();
        assert_eq!(
            store.list_range("k", 10).await.unwrap(),
            vec![b"first".to_vec()]
        );
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let store = LmdbKvStore::new(dir.path(), 16).expect("open lmdb");
            store.set("k", b"persisted", None).await.unwrap();
        }
        let store = LmdbKvStore::new(dir.path(), 16).expect("reopen lmdb");
        assert_eq!(store.get("k").await.unwrap(), Some(b"persisted".to_vec()));
    }
}
