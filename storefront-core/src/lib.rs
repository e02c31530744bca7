//! Storefront Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types and error enums - no business logic.

pub mod entities;
pub mod error;

pub use entities::{
    new_row_id, ActivityRecord, PriceTier, PricingMethod, Product, Specification, Timestamp,
    NEW_ROW_ID,
};
pub use error::{StorageError, StorageResult};
