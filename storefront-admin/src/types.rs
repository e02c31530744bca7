//! Request, response, and identity types for the admin core.
//!
//! The embedding layer hands these in already parsed; this crate validates
//! them and returns the [`ApiResponse`] envelope.

use serde::{Deserialize, Serialize};
use storefront_core::PricingMethod;

use crate::error::{AdminError, FailureClass};

// ============================================================================
// ACTOR IDENTITY
// ============================================================================

/// The authenticated identity performing an admin operation.
///
/// Authentication itself happens upstream; this carries only what the core
/// needs: who acted (for the activity log) and whether they hold the catalog
/// management privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorIdentity {
    pub actor_id: String,
    pub can_manage_catalog: bool,
}

// ============================================================================
// REQUEST TYPES
// ============================================================================

/// Submitted price tier row.
///
/// `id` of `None` or the `"new"` sentinel receives a freshly generated id on
/// insert; any other id is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTierInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub min_quantity: i32,
    pub price_per_unit: f64,
    pub display_order: i32,
}

/// Submitted specification row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub value: String,
    pub display_order: i32,
}

/// Validated payload for a product pricing update.
///
/// Child collections are optional: `None` leaves the collection untouched,
/// `Some(vec![])` is an explicit full clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateProductPricingRequest {
    pub base_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<f64>,
    pub pricing_method: PricingMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_tiers: Option<Vec<PriceTierInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Vec<SpecificationInput>>,
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

/// Product summary row for the cached admin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: String,
    pub name: String,
    pub base_price: f64,
    pub pricing_method: PricingMethod,
}

/// Successful update payload: the id of the updated parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedResource {
    pub id: String,
}

/// Error body of a failed envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    pub class: FailureClass,
}

/// Wire envelope: `{success: true, data}` or `{success: false, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(err: &AdminError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                class: err.class(),
            }),
        }
    }
}

impl<T> From<crate::error::AdminResult<T>> for ApiResponse<T> {
    fn from(result: crate::error::AdminResult<T>) -> Self {
        match result {
            Ok(data) => ApiResponse::ok(data),
            Err(err) => ApiResponse::err(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_shape() -> Result<(), serde_json::Error> {
        let response = ApiResponse::ok(UpdatedResource {
            id: "p1".to_string(),
        });
        let json = serde_json::to_value(&response)?;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["id"], "p1");
        assert!(json.get("error").is_none());
        Ok(())
    }

    #[test]
    fn test_envelope_failure_shape() -> Result<(), serde_json::Error> {
        let err = AdminError::forbidden("actor may not manage the catalog");
        let response: ApiResponse<UpdatedResource> = ApiResponse::err(&err);
        let json = serde_json::to_value(&response)?;
        assert_eq!(json["success"], false);
        assert!(json.get("data").is_none());
        assert_eq!(json["error"]["class"], "authorization");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("catalog"));
        Ok(())
    }

    #[test]
    fn test_tier_input_id_is_optional_on_the_wire() -> Result<(), serde_json::Error> {
        let input: PriceTierInput = serde_json::from_str(
            r#"{"min_quantity": 1, "price_per_unit": 10.0, "display_order": 0}"#,
        )?;
        assert_eq!(input.id, None);

        let input: PriceTierInput = serde_json::from_str(
            r#"{"id": "new", "min_quantity": 1, "price_per_unit": 10.0, "display_order": 0}"#,
        )?;
        assert_eq!(input.id.as_deref(), Some("new"));
        Ok(())
    }
}
