//! Admin cache layer.
//!
//! Cache-aside wrapper over a [`KvStore`]: the update service invalidates
//! after commits, the cache itself never watches the transactional store.
//!
//! Every operation here is fail-open. A backend failure is logged with
//! `tracing::warn!` and degrades to a miss (`get`) or a no-op
//! (`set_with_ttl` / `invalidate`); no error ever reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::kv::KvStore;

// ============================================================================
// KEY NAMESPACE AND TTL TABLE
// ============================================================================

/// Key prefix shared by every storefront-managed key.
pub const CACHE_NAMESPACE: &str = "storefront";

/// Collection-level cache of admin product summaries.
pub const PRODUCT_LIST_CACHE_KEY: &str = "storefront:admin:products";

/// Collection-level cache of admin dashboard aggregates.
pub const DASHBOARD_CACHE_KEY: &str = "storefront:admin:dashboard";

/// TTL for the product list cache.
pub const PRODUCT_LIST_TTL: Duration = Duration::from_secs(300);

/// TTL for the dashboard cache.
pub const DASHBOARD_TTL: Duration = Duration::from_secs(60);

/// The full fixed set of admin-facing cache keys this system manages.
/// `invalidate(None)` deletes all of them.
pub const ADMIN_CACHE_KEYS: [&str; 2] = [PRODUCT_LIST_CACHE_KEY, DASHBOARD_CACHE_KEY];

// ============================================================================
// ADMIN CACHE
// ============================================================================

/// Fail-open cache over a key/value backend.
///
/// Values are stored as JSON. A payload that fails to decode is treated as a
/// miss, same as a backend failure.
pub struct AdminCache<S: KvStore> {
    store: Arc<S>,
}

impl<S: KvStore> Clone for AdminCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore> AdminCache<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetch and deserialize a cached value. Returns None on miss, expiry,
    /// backend failure, or decode failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key).await {
            Ok(bytes) => bytes?,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache get failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "cached payload failed to decode, treating as miss");
                None
            }
        }
    }

    /// Best-effort write with an expiry. Failure is logged and swallowed.
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key, error = %err, "cache value failed to serialize, skipping write");
                return;
            }
        };

        if let Err(err) = self.store.set(key, &bytes, Some(ttl)).await {
            tracing::warn!(key, error = %err, "cache set failed, skipping write");
        }
    }

    /// Delete one key, or the full fixed admin key set when `key` is None.
    /// Failure is logged and swallowed.
    pub async fn invalidate(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                if let Err(err) = self.store.delete(key).await {
                    tracing::warn!(key, error = %err, "cache invalidation failed");
                }
            }
            None => {
                for key in ADMIN_CACHE_KEYS {
                    if let Err(err) = self.store.delete(key).await {
                        tracing::warn!(key, error = %err, "cache invalidation failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKvStore;
    use async_trait::async_trait;
    use storefront_core::{StorageError, StorageResult};

    /// Backend whose every operation fails, for fail-open coverage.
    struct FailingKvStore;

    #[async_trait]
    impl KvStore for FailingKvStore {
        async fn get(&self, _key: &str) -> StorageResult<Option<Vec<u8>>> {
            Err(StorageError::backend("store unreachable"))
        }
        async fn set(
            &self,
            _key: &str,
            _value: &[u8],
            _ttl: Option<Duration>,
        ) -> StorageResult<()> {
            Err(StorageError::backend("store unreachable"))
        }
        async fn delete(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::backend("store unreachable"))
        }
        async fn list_push_front(&self, _key: &str, _value: &[u8]) -> StorageResult<()> {
            Err(StorageError::backend("store unreachable"))
        }
        async fn list_trim(&self, _key: &str, _max_len: usize) -> StorageResult<()> {
            Err(StorageError::backend("store unreachable"))
        }
        async fn list_range(&self, _key: &str, _limit: usize) -> StorageResult<Vec<Vec<u8>>> {
            Err(StorageError::backend("store unreachable"))
        }
    }

    #[tokio::test]
    async fn test_round_trip_and_invalidate() {
        let cache = AdminCache::new(Arc::new(MemoryKvStore::new()));

        cache
            .set_with_ttl(PRODUCT_LIST_CACHE_KEY, &vec!["p1", "p2"], PRODUCT_LIST_TTL)
            .await;
        let cached: Option<Vec<String>> = cache.get(PRODUCT_LIST_CACHE_KEY).await;
        assert_eq!(cached, Some(vec!["p1".to_string(), "p2".to_string()]));

        cache.invalidate(Some(PRODUCT_LIST_CACHE_KEY)).await;
        let cached: Option<Vec<String>> = cache.get(PRODUCT_LIST_CACHE_KEY).await;
        assert_eq!(cached, None);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_every_admin_key() {
        let cache = AdminCache::new(Arc::new(MemoryKvStore::new()));

        cache
            .set_with_ttl(PRODUCT_LIST_CACHE_KEY, &1u32, PRODUCT_LIST_TTL)
            .await;
        cache
            .set_with_ttl(DASHBOARD_CACHE_KEY, &2u32, DASHBOARD_TTL)
            .await;

        cache.invalidate(None).await;

        assert_eq!(cache.get::<u32>(PRODUCT_LIST_CACHE_KEY).await, None);
        assert_eq!(cache.get::<u32>(DASHBOARD_CACHE_KEY).await, None);
    }

    #[tokio::test]
    async fn test_ttl_elapsed_reads_as_miss() {
        let cache = AdminCache::new(Arc::new(MemoryKvStore::new()));

        cache
            .set_with_ttl("k", &"v".to_string(), Duration::from_millis(40))
            .await;
        assert_eq!(cache.get::<String>("k").await, Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get::<String>("k").await, None);
    }

    #[tokio::test]
    async fn test_fail_open_on_unreachable_backend() {
        let cache = AdminCache::new(Arc::new(FailingKvStore));

        // get degrades to a miss; writes and invalidation return without error.
        assert_eq!(cache.get::<String>("k").await, None);
        cache.set_with_ttl("k", &"v", Duration::from_secs(1)).await;
        cache.invalidate(Some("k")).await;
        cache.invalidate(None).await;
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_a_miss() {
        let store = Arc::new(MemoryKvStore::new());
        store.set("k", b"not-json", None).await.unwrap();

        let cache = AdminCache::new(store);
        assert_eq!(cache.get::<Vec<String>>("k").await, None);
    }
}
