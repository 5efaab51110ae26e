//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Guarded Stock Delta
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ Read-then-write (lost update under concurrency)                    │
//! │     SELECT stock ... ; UPDATE products SET stock = 7                   │
//! │                                                                         │
//! │  ✅ Conditional delta (the store serializes writers)                   │
//! │     UPDATE products SET stock = stock + ?delta                         │
//! │     WHERE id = ? AND is_deleted = 0 AND stock + ?delta >= 0            │
//! │     RETURNING *                                                        │
//! │                                                                         │
//! │  No row back → caller looks the product up to tell                    │
//! │  "not found" from "insufficient stock".                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopledger_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let products = repo.list_active().await?;
///
/// // Inside an atomic unit
/// let updated = ProductRepository::apply_stock_delta(&mut *tx, &id, -2, now).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists non-deleted products, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_deleted = 0 ORDER BY rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Lists non-deleted products in insertion order (analytics input).
    pub async fn list_active_in_order(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_deleted = 0 ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a non-deleted product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        Self::find_active(&self.pool, id).await
    }

    /// Counts non-deleted products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_deleted = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Executor-generic operations (usable inside a transaction)
    // -------------------------------------------------------------------------

    /// Finds a non-deleted product.
    pub async fn find_active<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ?1 AND is_deleted = 0",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    /// Inserts a new product. The caller generates the id and timestamps.
    pub async fn insert<'e, E>(executor: E, product: &Product) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_cents, cost_cents,
                stock, min_stock, status, is_deleted,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.status)
        .bind(product.is_deleted)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Applies a signed stock delta if the result stays non-negative and
    /// recomputes status in the same statement.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Updated product
    /// * `Ok(None)` - Missing, deleted, or the delta would go negative
    pub async fn apply_stock_delta<'e, E>(
        executor: E,
        id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %id, delta = delta, "Applying stock delta");

        // Every RHS sees the pre-update row, so `stock + ?2` is the new stock
        // in both the SET and the CASE.
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET
                stock = stock + ?2,
                status = CASE WHEN stock + ?2 > 0 THEN 'active' ELSE 'out_of_stock' END,
                updated_at = ?3
            WHERE id = ?1 AND is_deleted = 0 AND stock + ?2 >= 0
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .fetch_optional(executor)
        .await?;

        Ok(product)
    }

    /// Writes every mutable column of a product (details and stock).
    ///
    /// Returns `None` when the product is missing or deleted.
    pub async fn update<'e, E>(executor: E, product: &Product) -> DbResult<Option<Product>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %product.id, "Updating product");

        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET
                name = ?2,
                category = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                stock = ?6,
                min_stock = ?7,
                status = ?8,
                updated_at = ?9
            WHERE id = ?1 AND is_deleted = 0
            RETURNING *
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.status)
        .bind(product.updated_at)
        .fetch_optional(executor)
        .await?;

        Ok(updated)
    }

    /// Soft-deletes a product. Returns false if it was missing or already
    /// deleted.
    ///
    /// Movements and service parts keep referencing the row.
    pub async fn soft_delete<'e, E>(executor: E, id: &str, now: DateTime<Utc>) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_deleted = 1, updated_at = ?2 WHERE id = ?1 AND is_deleted = 0",
        )
        .bind(id)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
