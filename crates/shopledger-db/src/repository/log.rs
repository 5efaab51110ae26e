//! # System Log Repository
//!
//! Append-only audit feed.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::DbResult;
use shopledger_core::SystemLog;

#[derive(Debug, Clone)]
pub struct LogRepository {
    pool: SqlitePool,
}

impl LogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LogRepository { pool }
    }

    /// Most recent entries first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<SystemLog>> {
        let logs = sqlx::query_as::<_, SystemLog>(
            "SELECT * FROM system_logs ORDER BY rowid DESC LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    pub async fn insert<'e, E>(executor: E, log: &SystemLog) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO system_logs (id, user_id, action, category, details, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&log.id)
        .bind(&log.user_id)
        .bind(&log.action)
        .bind(&log.category)
        .bind(&log.details)
        .bind(log.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}
