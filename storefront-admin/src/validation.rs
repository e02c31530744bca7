//! Validation Traits
//!
//! Common validation patterns plus the pricing-request validator. Validation
//! runs before any transaction is opened: a rejected request has no side
//! effects.
//!
//! Deliberately unvalidated, matching the system's behavior: display_order
//! values (any i32, duplicates allowed) and child-row counts (unbounded).

use crate::error::{AdminError, AdminResult};
use crate::types::UpdateProductPricingRequest;

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty (after trimming).
    fn validate_non_empty(&self, field_name: &str) -> AdminResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> AdminResult<()> {
        if self.trim().is_empty() {
            return Err(AdminError::validation(format!(
                "Required field '{field_name}' is missing"
            )));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> AdminResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

/// Trait for validating monetary amounts.
pub trait ValidatePrice {
    /// Validate that the value is a finite, non-negative amount.
    fn validate_price(&self, field_name: &str) -> AdminResult<()>;
}

impl ValidatePrice for f64 {
    fn validate_price(&self, field_name: &str) -> AdminResult<()> {
        if !self.is_finite() || *self < 0.0 {
            return Err(AdminError::validation(format!(
                "Field '{field_name}' must be a non-negative amount"
            )));
        }
        Ok(())
    }
}

impl ValidatePrice for Option<f64> {
    fn validate_price(&self, field_name: &str) -> AdminResult<()> {
        match self {
            Some(value) => value.validate_price(field_name),
            None => Ok(()),
        }
    }
}

/// Validate the scalar parent fields and the shape of the submitted
/// child-row lists.
pub fn validate_pricing_request(
    product_id: &str,
    req: &UpdateProductPricingRequest,
) -> AdminResult<()> {
    product_id.validate_non_empty("product_id")?;
    req.base_price.validate_price("base_price")?;
    req.compare_at_price.validate_price("compare_at_price")?;

    if let Some(tiers) = &req.price_tiers {
        for (index, tier) in tiers.iter().enumerate() {
            tier.price_per_unit
                .validate_price(&format!("price_tiers[{index}].price_per_unit"))?;
        }
    }

    if let Some(specs) = &req.specifications {
        for (index, spec) in specs.iter().enumerate() {
            spec.name
                .validate_non_empty(&format!("specifications[{index}].name"))?;
        }
    }

    Ok(())
}
