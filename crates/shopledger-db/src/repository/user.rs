//! # User Repository
//!
//! Staff records. Only read for actor attribution.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopledger_core::User;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// The earliest registered admin, if any.
    pub async fn first_admin(&self) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'admin' ORDER BY rowid ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already registered
    pub async fn insert<'e, E>(executor: E, user: &User) -> DbResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        debug!(id = %user.id, email = %user.email, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, name, email, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }
}
