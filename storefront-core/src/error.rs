//! Error types for storefront storage operations

use thiserror::Error;

/// Key/value storage layer errors.
///
/// These never cross into the admin error taxonomy: the cache and activity
/// layers swallow them and degrade to "absent" / "no effect".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Backend unavailable: {reason}")]
    Backend { reason: String },

    #[error("Serialization failed for key {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    pub fn backend(reason: impl Into<String>) -> Self {
        StorageError::Backend {
            reason: reason.into(),
        }
    }

    pub fn serialization(key: impl Into<String>, reason: impl Into<String>) -> Self {
        StorageError::Serialization {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
