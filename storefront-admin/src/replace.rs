//! Collection Replacer
//!
//! Generic delete-then-insert replacement of a parent's dependent rows,
//! always run inside an already-open transaction: one DELETE for the
//! parent's row set, then inserts in submitted order. Because both phases
//! share the transaction, a failed insert rolls the delete back too and the
//! pre-operation row set stays intact.
//!
//! The replacer stores display_order verbatim: no sorting, no dedupe, no
//! uniqueness enforcement. Ordering semantics belong to the caller.

use async_trait::async_trait;
use deadpool_postgres::Transaction;

use crate::error::AdminResult;
use crate::types::{PriceTierInput, SpecificationInput};
use storefront_core::{new_row_id, NEW_ROW_ID};

// ============================================================================
// DEPENDENT ROW SEAM
// ============================================================================

/// A submitted dependent row the replacer knows how to persist.
#[async_trait]
pub trait DependentRow: Send + Sync {
    /// Statement deleting every row whose parent foreign key equals `$1`.
    const DELETE_BY_PARENT: &'static str;

    /// The id submitted by the caller, if any.
    fn submitted_id(&self) -> Option<&str>;

    /// Insert this row under `id` for `parent_id`, all fields verbatim.
    async fn insert(&self, tx: &Transaction<'_>, parent_id: &str, id: &str) -> AdminResult<()>;
}

/// Resolve the id a dependent row will be stored under: a submitted id other
/// than the `"new"` sentinel is preserved; anything else gets a fresh id.
fn resolve_row_id(submitted: Option<&str>) -> String {
    match submitted {
        Some(id) if !id.trim().is_empty() && id != NEW_ROW_ID => id.to_string(),
        _ => new_row_id(),
    }
}

// ============================================================================
// REPLACE ALGORITHM
// ============================================================================

/// Replace the full dependent-row set of `parent_id` with `rows`.
///
/// An empty `rows` slice is a valid full clear. Returns the stored ids in
/// insertion order.
pub async fn replace_children<R: DependentRow>(
    tx: &Transaction<'_>,
    parent_id: &str,
    rows: &[R],
) -> AdminResult<Vec<String>> {
    tx.execute(R::DELETE_BY_PARENT, &[&parent_id]).await?;

    let mut ids = Vec::with_capacity(rows.len());
    for row in rows {
        let id = resolve_row_id(row.submitted_id());
        row.insert(tx, parent_id, &id).await?;
        ids.push(id);
    }
    Ok(ids)
}

// ============================================================================
// ROW IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl DependentRow for PriceTierInput {
    const DELETE_BY_PARENT: &'static str = "DELETE FROM price_tiers WHERE product_id = $1";

    fn submitted_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    async fn insert(&self, tx: &Transaction<'_>, parent_id: &str, id: &str) -> AdminResult<()> {
        tx.execute(
            "INSERT INTO price_tiers (tier_id, product_id, min_quantity, price_per_unit, display_order) \
             VALUES ($1, $2, $3, $4, $5)",
            &[
                &id,
                &parent_id,
                &self.min_quantity,
                &self.price_per_unit,
                &self.display_order,
            ],
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DependentRow for SpecificationInput {
    const DELETE_BY_PARENT: &'static str =
        "DELETE FROM product_specifications WHERE product_id = $1";

    fn submitted_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    async fn insert(&self, tx: &Transaction<'_>, parent_id: &str, id: &str) -> AdminResult<()> {
        tx.execute(
            "INSERT INTO product_specifications (spec_id, product_id, name, value, display_order) \
             VALUES ($1, $2, $3, $4, $5)",
            &[&id, &parent_id, &self.name, &self.value, &self.display_order],
        )
        .await?;
        Ok(())
    }
}
