//! Storefront Storage - Key/Value Backends, Cache, and Activity Log
//!
//! Defines the key/value store abstraction shared by the admin cache and the
//! per-actor activity log, plus two backends: an in-memory store for tests
//! and an LMDB-backed store (heed) for production.
//!
//! The cache and activity layers here are deliberately fail-open: a backend
//! failure degrades to a cache miss / dropped log entry, never an error the
//! caller has to handle.

pub mod activity;
pub mod cache;
pub mod kv;
pub mod lmdb_kv;

pub use activity::{activity_key, ActivityLog, DEFAULT_RECENT_LIMIT, MAX_ACTIVITY_RECORDS};
pub use cache::{
    AdminCache, ADMIN_CACHE_KEYS, CACHE_NAMESPACE, DASHBOARD_CACHE_KEY, DASHBOARD_TTL,
    PRODUCT_LIST_CACHE_KEY, PRODUCT_LIST_TTL,
};
pub use kv::{KvStore, MemoryKvStore};
pub use lmdb_kv::{LmdbKvError, LmdbKvStore};
