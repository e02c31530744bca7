//! Storefront Admin Core
//!
//! The transactional heart of the storefront admin: product pricing updates
//! with atomic replacement of dependent child collections (price tiers,
//! specifications), a cache-aside admin cache kept coherent with those
//! writes, and a bounded per-actor activity log.
//!
//! The transport layer (HTTP routing, request parsing, authentication) lives
//! elsewhere; its contract with this crate is: authenticated
//! [`ActorIdentity`](types::ActorIdentity) in, validated request payload in,
//! [`ApiResponse`](types::ApiResponse) out.

pub mod db;
pub mod error;
pub mod replace;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

pub use db::{DbClient, DbConfig};
pub use error::{AdminError, AdminResult, FailureClass};
pub use services::PricingService;
pub use state::AppState;
pub use types::{
    ActorIdentity, ApiResponse, PriceTierInput, ProductSummary, SpecificationInput,
    UpdateProductPricingRequest, UpdatedResource,
};
