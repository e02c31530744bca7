//! Error Types for the Storefront Admin Core
//!
//! One taxonomy for the primary update path:
//! - Validation and Forbidden reject before any transaction is opened
//! - NotFound and Transaction abort the transactional phase (full rollback)
//!
//! Cache and activity-log failures never appear here: those layers are
//! fail-open and swallow their own errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// FAILURE CLASSIFICATION
// ============================================================================

/// Coarse failure class exposed to the embedding layer (HTTP status mapping,
/// metrics, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Malformed or missing input, or a request targeting an unknown resource.
    Validation,
    /// The acting identity lacks the required privilege.
    Authorization,
    /// Any failure during the transactional phase.
    Internal,
}

// ============================================================================
// ADMIN ERROR
// ============================================================================

/// Typed failure for admin operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdminError {
    /// Rejected before any transaction; no side effects occurred.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Actor lacks the required privilege; rejected before any transaction.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The targeted resource does not exist. Raised inside the transactional
    /// phase and aborts it.
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Any other failure during the transactional phase. The transaction was
    /// rolled back; the pre-operation state is intact.
    #[error("Transaction failed: {reason}")]
    Transaction { reason: String },
}

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        AdminError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AdminError::Forbidden(message.into())
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        AdminError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn transaction(reason: impl Into<String>) -> Self {
        AdminError::Transaction {
            reason: reason.into(),
        }
    }

    /// Classify this error for the response envelope.
    ///
    /// A nonexistent target is a client error, so NotFound classifies with
    /// validation rather than internal failures.
    pub fn class(&self) -> FailureClass {
        match self {
            AdminError::Validation(_) | AdminError::NotFound { .. } => FailureClass::Validation,
            AdminError::Forbidden(_) => FailureClass::Authorization,
            AdminError::Transaction { .. } => FailureClass::Internal,
        }
    }
}

// ============================================================================
// CONVERSIONS FROM STORE ERRORS
// ============================================================================

impl From<tokio_postgres::Error> for AdminError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!(error = %err, "database error");
        AdminError::transaction(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for AdminError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!(error = %err, "connection pool error");
        match err {
            deadpool_postgres::PoolError::Timeout(_) => {
                AdminError::transaction("database connection pool exhausted")
            }
            deadpool_postgres::PoolError::Closed => {
                AdminError::transaction("database connection pool is closed")
            }
            _ => AdminError::transaction(err.to_string()),
        }
    }
}

/// Result type alias for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert_eq!(
            AdminError::validation("bad").class(),
            FailureClass::Validation
        );
        assert_eq!(
            AdminError::forbidden("no").class(),
            FailureClass::Authorization
        );
        assert_eq!(
            AdminError::not_found("product", "p1").class(),
            FailureClass::Validation
        );
        assert_eq!(
            AdminError::transaction("boom").class(),
            FailureClass::Internal
        );
    }

    #[test]
    fn test_error_display() {
        let err = AdminError::not_found("product", "p1");
        assert_eq!(err.to_string(), "product p1 not found");

        let err = AdminError::transaction("deadlock detected");
        assert!(err.to_string().contains("deadlock detected"));
    }
}
