//! # Ledger Store Handle
//!
//! Opens the SQLite file, applies migrations, and hands out repositories
//! and transactions.
//!
//! ```text
//! Database::new(DbConfig)
//!     │
//!     ├──► db.products() / db.movements() / ...   pool-backed reads
//!     │
//!     └──► db.begin_immediate() ──► Repository::write(&mut *tx, ..) ──► tx.commit()
//!                                    (dropping tx without commit rolls back)
//! ```
//!
//! Connections run in WAL mode with foreign keys on. Write units open with
//! `BEGIN IMMEDIATE`: the write lock is taken up front and waits on the busy
//! timeout, so a unit that reads before it writes never holds a snapshot a
//! competing writer can invalidate. A deferred transaction in that position
//! fails with `SQLITE_BUSY` straight away instead of waiting.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqlitePool};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    LogRepository, MovementRepository, PettyCashRepository, ProductRepository,
    ServiceOrderRepository, TransactionRepository, UserRepository,
};

/// An open database transaction. Dropping it without `commit()` rolls back.
pub type DbTransaction = sqlx::Transaction<'static, Sqlite>;

// =============================================================================
// Configuration
// =============================================================================

/// Where the ledger lives and how the pool behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/shopledger/ledger.db").max_connections(4);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Pool acquire timeout, also used as the SQLite busy timeout.
    pub connect_timeout: Duration,
    /// `None` keeps idle connections open.
    pub idle_timeout: Option<Duration>,
    /// `None` never recycles a connection.
    pub max_lifetime: Option<Duration>,
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed store, created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Throwaway store for tests and demos.
    ///
    /// The database lives inside its single connection, which is never
    /// reaped. Code must not touch the pool while it holds an open
    /// transaction.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: None,
            max_lifetime: None,
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the ledger store. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Creates the pool and runs migrations (if enabled).
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening ledger store");

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(config.connect_timeout)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begins a deferred transaction. The lock is taken by the first
    /// statement that needs it.
    pub async fn begin(&self) -> DbResult<DbTransaction> {
        self.pool.begin().await.map_err(DbError::transaction)
    }

    /// Begins a transaction holding the write lock. Every engine write unit
    /// is one of these.
    pub async fn begin_immediate(&self) -> DbResult<DbTransaction> {
        self.pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DbError::transaction)
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn movements(&self) -> MovementRepository {
        MovementRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    pub fn service_orders(&self) -> ServiceOrderRepository {
        ServiceOrderRepository::new(self.pool.clone())
    }

    pub fn petty_cash(&self) -> PettyCashRepository {
        PettyCashRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn logs(&self) -> LogRepository {
        LogRepository::new(self.pool.clone())
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing ledger store");
        self.pool.close().await;
    }

    /// `true` when a trivial query succeeds.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
