//! # Petty Cash Repository

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopledger_core::PettyCashEntry;

#[derive(Debug, Clone)]
pub struct PettyCashRepository {
    pool: SqlitePool,
}

impl PettyCashRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PettyCashRepository { pool }
    }

    /// Lists entries newest first.
    pub async fn list(&self) -> DbResult<Vec<PettyCashEntry>> {
        let entries = sqlx::query_as::<_, PettyCashEntry>(
            "SELECT * FROM petty_cash ORDER BY rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Σ deposits − Σ expenses, in cents.
    pub async fn balance_cents(&self) -> DbResult<i64> {
        let balance: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN entry_type = 'deposit' THEN amount_cents ELSE -amount_cents END
            ), 0)
            FROM petty_cash
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    pub async fn insert<'e, E>(executor: E, entry: &PettyCashEntry) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %entry.id, amount_cents = entry.amount_cents, "Inserting petty cash entry");

        sqlx::query(
            r#"
            INSERT INTO petty_cash (id, entry_type, amount_cents, description, date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.entry_type)
        .bind(entry.amount_cents)
        .bind(&entry.description)
        .bind(entry.date)
        .execute(executor)
        .await?;

        Ok(())
    }
}
