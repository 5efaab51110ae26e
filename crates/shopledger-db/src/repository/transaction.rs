//! # Transaction Repository
//!
//! Ledger entries. Rows are immutable except for the service-order sync
//! (`sync_service_details`) and delivery settlement (`mark_paid`).

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopledger_core::Transaction;

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Lists transactions newest first. `limit = None` returns everything.
    pub async fn list(&self, limit: Option<u32>) -> DbResult<Vec<Transaction>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(i64::from).unwrap_or(-1);

        let transactions = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions ORDER BY rowid DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(transaction)
    }

    /// Paid income minus paid expense, in cents.
    pub async fn balance_cents<'e, E>(executor: E) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let balance: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN transaction_type = 'income' THEN amount_cents ELSE -amount_cents END
            ), 0)
            FROM transactions
            WHERE status = 'paid'
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(balance)
    }

    pub async fn insert<'e, E>(executor: E, transaction: &Transaction) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(
            id = %transaction.id,
            amount_cents = transaction.amount_cents,
            category = %transaction.category,
            "Inserting transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, transaction_type, amount_cents, cost_amount_cents,
                category, status, description, client_name, payment_method,
                service_order_id, date, due_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&transaction.id)
        .bind(transaction.transaction_type)
        .bind(transaction.amount_cents)
        .bind(transaction.cost_amount_cents)
        .bind(&transaction.category)
        .bind(transaction.status)
        .bind(&transaction.description)
        .bind(&transaction.client_name)
        .bind(&transaction.payment_method)
        .bind(&transaction.service_order_id)
        .bind(transaction.date)
        .bind(transaction.due_date)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// The transaction generated for a service order, if any.
    pub async fn find_by_service_order<'e, E>(
        executor: E,
        service_order_id: &str,
    ) -> DbResult<Option<Transaction>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let transaction = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE service_order_id = ?1 ORDER BY rowid ASC LIMIT 1",
        )
        .bind(service_order_id)
        .fetch_optional(executor)
        .await?;

        Ok(transaction)
    }

    /// Settles a pending transaction. No-op if already paid.
    pub async fn mark_paid<'e, E>(executor: E, id: &str, date: DateTime<Utc>) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %id, "Marking transaction paid");

        let result = sqlx::query(
            "UPDATE transactions SET status = 'paid', date = ?2 WHERE id = ?1 AND status = 'pending'",
        )
        .bind(id)
        .bind(date)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mirrors edited service order details onto its pending transaction.
    pub async fn sync_service_details<'e, E>(
        executor: E,
        id: &str,
        description: &str,
        client_name: &str,
        amount_cents: i64,
    ) -> DbResult<bool>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET description = ?2, client_name = ?3, amount_cents = ?4
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(description)
        .bind(client_name)
        .bind(amount_cents)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
