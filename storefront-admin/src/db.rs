//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, the scoped
//! transaction runner, and the read helpers the admin core needs.
//!
//! The transaction runner is the only way this crate opens a transaction:
//! every exit path resolves to exactly one of commit or rollback.

use std::time::Duration;

use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime, Transaction};
use futures_util::future::BoxFuture;
use tokio_postgres::NoTls;

use crate::error::{AdminError, AdminResult};
use crate::types::ProductSummary;
use storefront_core::{PriceTier, PricingMethod, Product, Specification};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "storefront".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("STOREFRONT_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("STOREFRONT_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("STOREFRONT_DB_NAME")
                .unwrap_or_else(|_| "storefront".to_string()),
            user: std::env::var("STOREFRONT_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("STOREFRONT_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("STOREFRONT_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("STOREFRONT_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> AdminResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| AdminError::transaction(format!("Failed to create pool: {e}")))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT
// ============================================================================

/// Database client wrapping a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> AdminResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    pub(crate) async fn get_conn(&self) -> AdminResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(AdminError::from)
    }

    // ========================================================================
    // TRANSACTION RUNNER
    // ========================================================================

    /// Run `work` inside a single transaction.
    ///
    /// Acquires a connection, begins a transaction, and invokes `work` with a
    /// handle bound to it. On `Ok` the transaction commits; on `Err` it is
    /// rolled back (a rollback failure is logged, the original error still
    /// propagates). Exactly one of commit or rollback occurs per invocation.
    ///
    /// If the returned future is dropped before `work` resolves, the
    /// transaction guard's drop path rolls back when the connection is
    /// recycled; an open transaction is never handed back to the pool live.
    ///
    /// No automatic retry: a failed transaction surfaces to the caller, who
    /// decides whether to re-run the whole operation.
    pub async fn with_transaction<T, F>(&self, work: F) -> AdminResult<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t Transaction<'t>) -> BoxFuture<'t, AdminResult<T>> + Send,
    {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await?;

        match work(&tx).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::error!(error = %rollback_err, "transaction rollback failed");
                }
                Err(err)
            }
        }
    }

    // ========================================================================
    // PRODUCT READS
    // ========================================================================

    /// Fetch a product by id.
    pub async fn product_get(&self, product_id: &str) -> AdminResult<Option<Product>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT product_id, name, base_price, compare_at_price, pricing_method, updated_at \
                 FROM products WHERE product_id = $1",
                &[&product_id],
            )
            .await?;

        row.map(|row| {
            Ok(Product {
                product_id: row.get(0),
                name: row.get(1),
                base_price: row.get(2),
                compare_at_price: row.get(3),
                pricing_method: parse_pricing_method(row.get(4))?,
                updated_at: row.get(5),
            })
        })
        .transpose()
    }

    /// Fetch a product's price tiers, in display order.
    pub async fn product_tiers(&self, product_id: &str) -> AdminResult<Vec<PriceTier>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT tier_id, product_id, min_quantity, price_per_unit, display_order \
                 FROM price_tiers WHERE product_id = $1 ORDER BY display_order, tier_id",
                &[&product_id],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| PriceTier {
                tier_id: row.get(0),
                product_id: row.get(1),
                min_quantity: row.get(2),
                price_per_unit: row.get(3),
                display_order: row.get(4),
            })
            .collect())
    }

    /// Fetch a product's specifications, in display order.
    pub async fn product_specifications(
        &self,
        product_id: &str,
    ) -> AdminResult<Vec<Specification>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT spec_id, product_id, name, value, display_order \
                 FROM product_specifications WHERE product_id = $1 ORDER BY display_order, spec_id",
                &[&product_id],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| Specification {
                spec_id: row.get(0),
                product_id: row.get(1),
                name: row.get(2),
                value: row.get(3),
                display_order: row.get(4),
            })
            .collect())
    }

    /// List product summaries for the cached admin list.
    pub async fn product_list(&self) -> AdminResult<Vec<ProductSummary>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT product_id, name, base_price, pricing_method \
                 FROM products ORDER BY name, product_id",
                &[],
            )
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ProductSummary {
                    product_id: row.get(0),
                    name: row.get(1),
                    base_price: row.get(2),
                    pricing_method: parse_pricing_method(row.get(3))?,
                })
            })
            .collect()
    }
}

fn parse_pricing_method(raw: &str) -> AdminResult<PricingMethod> {
    PricingMethod::parse(raw)
        .ok_or_else(|| AdminError::transaction(format!("unknown pricing method '{raw}' in store")))
}

// ============================================================================
// TEST SUPPORT
// ============================================================================
