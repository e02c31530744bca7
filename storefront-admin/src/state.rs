//! Shared application state.
//!
//! The cache and activity log are process-wide singletons over one LMDB
//! store; each request handler clones the cheap handles it needs.

use std::sync::Arc;

use storefront_storage::{ActivityLog, AdminCache, LmdbKvStore};

use crate::db::{DbClient, DbConfig};
use crate::error::{AdminError, AdminResult};
use crate::services::PricingService;

/// Key/value backend used in production state.
pub type AdminKv = LmdbKvStore;

/// Application-wide state shared across request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Raw database client.
    pub db: DbClient,
    /// Admin cache over the shared key/value store.
    pub cache: AdminCache<AdminKv>,
    /// Per-actor activity log over the same store.
    pub activity: ActivityLog<AdminKv>,
    /// Pricing update service composed from the three above.
    pub pricing: PricingService<AdminKv>,
}

impl AppState {
    /// Compose state from an existing database client and key/value store.
    pub fn new(db: DbClient, store: Arc<AdminKv>) -> Self {
        let cache = AdminCache::new(Arc::clone(&store));
        let activity = ActivityLog::new(store);
        let pricing = PricingService::new(db.clone(), cache.clone(), activity.clone());
        Self {
            db,
            cache,
            activity,
            pricing,
        }
    }

    /// Build state from `STOREFRONT_*` environment variables.
    ///
    /// `STOREFRONT_CACHE_PATH` selects the LMDB directory (default
    /// `./data/cache`), `STOREFRONT_CACHE_SIZE_MB` its map size.
    pub fn from_env() -> AdminResult<Self> {
        let db = DbClient::from_config(&DbConfig::from_env())?;

        let path = std::env::var("STOREFRONT_CACHE_PATH")
            .unwrap_or_else(|_| "./data/cache".to_string());
        let size_mb = std::env::var("STOREFRONT_CACHE_SIZE_MB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256);
        let store = LmdbKvStore::new(&path, size_mb)
            .map_err(|e| AdminError::transaction(format!("Failed to open cache store: {e}")))?;

        Ok(Self::new(db, Arc::new(store)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_composes_shared_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(LmdbKvStore::new(dir.path(), 16).expect("lmdb"));
        let db = DbClient::from_config(&DbConfig::default()).expect("db client");
        let state = AppState::new(db, store);

        // Cache and activity share one store: both observe the same backend.
        state.activity.record("actor-1", "test.action", None).await;
        let recent = state.activity.recent("actor-1", 20).await;
        assert_eq!(recent.len(), 1);

        let cloned = state.clone();
        let recent = cloned.activity.recent("actor-1", 20).await;
        assert_eq!(recent.len(), 1);
    }
}
