//! Service layer
//!
//! Composition roots that tie the database, cache, and activity log
//! together. Route/transport layers call these; nothing here knows about
//! HTTP.

pub mod pricing_service;

pub use pricing_service::PricingService;
