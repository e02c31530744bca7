//! Core entity structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// ROW IDENTITY
// ============================================================================

/// Sentinel id a caller submits for a dependent row that should receive a
/// freshly generated id on insert.
pub const NEW_ROW_ID: &str = "new";

/// Generate a new row id as a UUIDv7 string (timestamp-sortable).
pub fn new_row_id() -> String {
    Uuid::now_v7().to_string()
}

// ============================================================================
// ENUMS
// ============================================================================

/// How a product's price is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMethod {
    /// Single fixed price.
    Fixed,
    /// Quantity-tiered pricing via price tiers.
    Tiered,
    /// Price on request.
    Quote,
}

impl PricingMethod {
    /// Stable string form used for storage and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingMethod::Fixed => "fixed",
            PricingMethod::Tiered => "tiered",
            PricingMethod::Quote => "quote",
        }
    }

    /// Parse the stable string form. Returns None for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(PricingMethod::Fixed),
            "tiered" => Some(PricingMethod::Tiered),
            "quote" => Some(PricingMethod::Quote),
            _ => None,
        }
    }
}

// ============================================================================
// ENTITIES
// ============================================================================

/// Product - parent resource whose pricing fields are mutated as a unit.
/// Owns zero or more price tiers and specifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub base_price: f64,
    pub compare_at_price: Option<f64>,
    pub pricing_method: PricingMethod,
    pub updated_at: Timestamp,
}

/// Price tier - dependent row keyed to a product.
///
/// `display_order` is caller-defined presentation ordering; it is stored
/// verbatim and is not required to be unique or contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTier {
    pub tier_id: String,
    pub product_id: String,
    pub min_quantity: i32,
    pub price_per_unit: f64,
    pub display_order: i32,
}

/// Specification - dependent key/value row keyed to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub spec_id: String,
    pub product_id: String,
    pub name: String,
    pub value: String,
    pub display_order: i32,
}

/// A single entry in the per-actor activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub actor_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: Timestamp,
}

impl ActivityRecord {
    /// Create a record stamped with the current time.
    pub fn now(actor_id: impl Into<String>, action: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
            action: action.into(),
            detail,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_row_id_is_unique() {
        let a = new_row_id();
        let b = new_row_id();
        assert_ne!(a, b);
        assert_ne!(a, NEW_ROW_ID);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn test_pricing_method_round_trip() {
        for method in [PricingMethod::Fixed, PricingMethod::Tiered, PricingMethod::Quote] {
            assert_eq!(PricingMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PricingMethod::parse("auction"), None);
    }

    #[test]
    fn test_activity_record_serialization() -> Result<(), serde_json::Error> {
        let record = ActivityRecord::now("actor-1", "product.pricing.update", None);
        let json = serde_json::to_string(&record)?;
        assert!(!json.contains("detail"));

        let with_detail =
            ActivityRecord::now("actor-1", "product.pricing.update", Some("p1".to_string()));
        let json = serde_json::to_string(&with_detail)?;
        let back: ActivityRecord = serde_json::from_str(&json)?;
        assert_eq!(back, with_detail);
        Ok(())
    }
}
