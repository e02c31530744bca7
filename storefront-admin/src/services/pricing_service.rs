//! Pricing Update Service
//!
//! Composition root for product pricing updates:
//! authorize -> validate -> transact -> invalidate cache -> record activity.
//!
//! Authorization and validation reject before any transaction is opened. The
//! scalar update and both child-collection replacements share one
//! transaction. Once it commits, cache invalidation is issued
//! unconditionally and one activity record is appended; failures in either
//! are logged by those layers and never affect the returned outcome.

use futures_util::FutureExt;
use storefront_core::ActivityRecord;
use storefront_storage::{
    ActivityLog, AdminCache, KvStore, DEFAULT_RECENT_LIMIT, PRODUCT_LIST_CACHE_KEY,
    PRODUCT_LIST_TTL,
};

use crate::db::DbClient;
use crate::error::{AdminError, AdminResult};
use crate::replace::replace_children;
use crate::types::{ActorIdentity, ProductSummary, UpdateProductPricingRequest, UpdatedResource};
use crate::validation::validate_pricing_request;

/// Action label recorded for pricing updates.
pub const PRICING_UPDATE_ACTION: &str = "product.pricing.update";

/// Product pricing service.
pub struct PricingService<S: KvStore> {
    db: DbClient,
    cache: AdminCache<S>,
    activity: ActivityLog<S>,
}

impl<S: KvStore> Clone for PricingService<S> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            cache: self.cache.clone(),
            activity: self.activity.clone(),
        }
    }
}

impl<S: KvStore> PricingService<S> {
    pub fn new(db: DbClient, cache: AdminCache<S>, activity: ActivityLog<S>) -> Self {
        Self {
            db,
            cache,
            activity,
        }
    }

    /// Update a product's scalar pricing fields and replace its submitted
    /// child collections, atomically.
    ///
    /// Child collections left as `None` are untouched; `Some(vec![])` clears
    /// the collection.
    pub async fn update_product_pricing(
        &self,
        actor: &ActorIdentity,
        product_id: &str,
        req: &UpdateProductPricingRequest,
    ) -> AdminResult<UpdatedResource> {
        if !actor.can_manage_catalog {
            return Err(AdminError::forbidden(
                "actor may not manage the product catalog",
            ));
        }
        validate_pricing_request(product_id, req)?;

        let pid = product_id.to_string();
        let payload = req.clone();
        self.db
            .with_transaction(move |tx| {
                async move {
                    let updated = tx
                        .execute(
                            "UPDATE products \
                             SET base_price = $1, compare_at_price = $2, pricing_method = $3, updated_at = now() \
                             WHERE product_id = $4",
                            &[
                                &payload.base_price,
                                &payload.compare_at_price,
                                &payload.pricing_method.as_str(),
                                &pid,
                            ],
                        )
                        .await?;
                    if updated == 0 {
                        return Err(AdminError::not_found("product", pid.clone()));
                    }

                    if let Some(tiers) = &payload.price_tiers {
                        replace_children(tx, &pid, tiers).await?;
                    }
                    if let Some(specs) = &payload.specifications {
                        replace_children(tx, &pid, specs).await?;
                    }
                    Ok(())
                }
                .boxed()
            })
            .await?;

        // Committed. Invalidation is unconditional from here on: it bounds
        // how long a concurrent reader can observe the stale cached state.
        self.cache.invalidate(None).await;
        self.activity
            .record(
                &actor.actor_id,
                PRICING_UPDATE_ACTION,
                Some(format!("product {product_id}")),
            )
            .await;

        Ok(UpdatedResource {
            id: product_id.to_string(),
        })
    }

    /// List product summaries, read-through against the admin products cache.
    pub async fn list_products(&self) -> AdminResult<Vec<ProductSummary>> {
        if let Some(products) = self.cache.get::<Vec<ProductSummary>>(PRODUCT_LIST_CACHE_KEY).await
        {
            return Ok(products);
        }

        let products = self.db.product_list().await?;
        self.cache
            .set_with_ttl(PRODUCT_LIST_CACHE_KEY, &products, PRODUCT_LIST_TTL)
            .await;
        Ok(products)
    }

    /// Recent activity for an actor, most-recent-first.
    pub async fn recent_activity(
        &self,
        actor_id: &str,
        limit: Option<usize>,
    ) -> Vec<ActivityRecord> {
        self.activity
            .recent(actor_id, limit.unwrap_or(DEFAULT_RECENT_LIMIT))
            .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
