//! # Service Order Repository
//!
//! Service orders and their part lines.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service_orders 1 ──── * service_parts   (ON DELETE CASCADE)           │
//! │        │                      │                                         │
//! │        │ 0..1                 └── product_id → products (kept)         │
//! │        ▼                                                                │
//! │  transactions.service_order_id           (ON DELETE SET NULL)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopledger_core::{ServiceOrder, ServiceOrderWithParts, ServicePart};

#[derive(Debug, Clone)]
pub struct ServiceOrderRepository {
    pool: SqlitePool,
}

impl ServiceOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ServiceOrderRepository { pool }
    }

    /// Lists orders newest first, each with its parts.
    pub async fn list_with_parts(&self) -> DbResult<Vec<ServiceOrderWithParts>> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders ORDER BY rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let parts = sqlx::query_as::<_, ServicePart>(
            "SELECT * FROM service_parts ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<String, Vec<ServicePart>> = HashMap::new();
        for part in parts {
            by_order
                .entry(part.service_order_id.clone())
                .or_default()
                .push(part);
        }

        let result = orders
            .into_iter()
            .map(|order| {
                let parts = by_order.remove(&order.id).unwrap_or_default();
                ServiceOrderWithParts { order, parts }
            })
            .collect();

        Ok(result)
    }

    /// Lists orders without parts, newest first.
    pub async fn list(&self) -> DbResult<Vec<ServiceOrder>> {
        let orders = sqlx::query_as::<_, ServiceOrder>(
            "SELECT * FROM service_orders ORDER BY rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn get_with_parts(&self, id: &str) -> DbResult<Option<ServiceOrderWithParts>> {
        let Some(order) = Self::find(&self.pool, id).await? else {
            return Ok(None);
        };
        let parts = Self::parts_for(&self.pool, id).await?;

        Ok(Some(ServiceOrderWithParts { order, parts }))
    }

    // -------------------------------------------------------------------------
    // Executor-generic operations
    // -------------------------------------------------------------------------

    pub async fn find<'e, E>(executor: E, id: &str) -> DbResult<Option<ServiceOrder>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let order = sqlx::query_as::<_, ServiceOrder>("SELECT * FROM service_orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;

        Ok(order)
    }

    pub async fn parts_for<'e, E>(executor: E, service_order_id: &str) -> DbResult<Vec<ServicePart>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let parts = sqlx::query_as::<_, ServicePart>(
            "SELECT * FROM service_parts WHERE service_order_id = ?1 ORDER BY rowid ASC",
        )
        .bind(service_order_id)
        .fetch_all(executor)
        .await?;

        Ok(parts)
    }

    pub async fn insert<'e, E>(executor: E, order: &ServiceOrder) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %order.id, device = %order.device_model, "Inserting service order");

        sqlx::query(
            r#"
            INSERT INTO service_orders (
                id, client_name, client_phone, device_model, description,
                status, price_cents, cost_cents, front_image_url, back_image_url,
                created_at, delivered_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&order.id)
        .bind(&order.client_name)
        .bind(&order.client_phone)
        .bind(&order.device_model)
        .bind(&order.description)
        .bind(order.status)
        .bind(order.price_cents)
        .bind(order.cost_cents)
        .bind(&order.front_image_url)
        .bind(&order.back_image_url)
        .bind(order.created_at)
        .bind(order.delivered_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    pub async fn insert_part<'e, E>(executor: E, part: &ServicePart) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO service_parts (
                id, service_order_id, product_id, quantity, unit_price_cents, unit_cost_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&part.id)
        .bind(&part.service_order_id)
        .bind(&part.product_id)
        .bind(part.quantity)
        .bind(part.unit_price_cents)
        .bind(part.unit_cost_cents)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Writes the editable columns. Cost and creation time are fixed at
    /// creation.
    pub async fn update<'e, E>(executor: E, order: &ServiceOrder) -> DbResult<Option<ServiceOrder>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %order.id, status = %order.status, "Updating service order");

        let updated = sqlx::query_as::<_, ServiceOrder>(
            r#"
            UPDATE service_orders
            SET
                client_name = ?2,
                client_phone = ?3,
                device_model = ?4,
                description = ?5,
                status = ?6,
                price_cents = ?7,
                front_image_url = ?8,
                back_image_url = ?9,
                delivered_at = ?10
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(&order.id)
        .bind(&order.client_name)
        .bind(&order.client_phone)
        .bind(&order.device_model)
        .bind(&order.description)
        .bind(order.status)
        .bind(order.price_cents)
        .bind(&order.front_image_url)
        .bind(&order.back_image_url)
        .bind(order.delivered_at)
        .fetch_optional(executor)
        .await?;

        Ok(updated)
    }

    /// Deletes an order. Parts cascade; linked transactions are unlinked.
    pub async fn delete<'e, E>(executor: E, id: &str) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %id, "Deleting service order");

        let result = sqlx::query("DELETE FROM service_orders WHERE id = ?1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
