//! # Stock Movement Repository
//!
//! Append-only. There is no update or delete.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopledger_core::StockMovement;

#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Lists movements newest first, optionally for one product.
    pub async fn list(&self, product_id: Option<&str>) -> DbResult<Vec<StockMovement>> {
        let movements = match product_id {
            Some(id) => {
                sqlx::query_as::<_, StockMovement>(
                    "SELECT * FROM stock_movements WHERE product_id = ?1 ORDER BY rowid DESC",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StockMovement>(
                    "SELECT * FROM stock_movements ORDER BY rowid DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(movements)
    }

    /// Full history of one product in recording order.
    pub async fn history(&self, product_id: &str) -> DbResult<Vec<StockMovement>> {
        Self::history_with(&self.pool, product_id).await
    }

    /// Σ signed quantities for a product.
    pub async fn net_quantity(&self, product_id: &str) -> DbResult<i64> {
        let net: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE WHEN movement_type = 'entry' THEN quantity ELSE -quantity END), 0)
            FROM stock_movements
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(net)
    }

    pub async fn history_with<'e, E>(executor: E, product_id: &str) -> DbResult<Vec<StockMovement>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE product_id = ?1 ORDER BY rowid ASC",
        )
        .bind(product_id)
        .fetch_all(executor)
        .await?;

        Ok(movements)
    }

    pub async fn insert<'e, E>(executor: E, movement: &StockMovement) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            "Recording stock movement"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, product_id, user_id, movement_type, quantity, reason, date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(&movement.user_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(movement.date)
        .execute(executor)
        .await?;

        Ok(())
    }
}
