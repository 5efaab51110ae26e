//! # Schema Migrations
//!
//! SQL files under the workspace `migrations/sqlite/` are compiled into the
//! binary and applied on open. Files are append-only: a schema change is a
//! new `NNN_description.sql`, never an edit to an applied one.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies pending migrations. Safe to call on an up-to-date store.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(known = MIGRATOR.migrations.len(), "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema up to date");
    Ok(())
}

/// `(known, applied)` migration counts. A store never migrated reports 0
/// applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let known = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((known, applied as usize))
}
