//! # shopledger-db: Database Layer for ShopLedger
//!
//! SQLite storage for products, movements, ledger entries, service orders,
//! petty cash and the audit feed, accessed through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopLedger Data Flow                             │
//! │                                                                         │
//! │  Engine operation (adjust_stock, create_service_order, ...)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopledger-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ MovementRepo  │    │ 001_initial  │  │   │
//! │  │   │ begin() → tx  │    │ ServiceRepo   │    │ _schema.sql  │  │   │
//! │  │   │               │    │ ...           │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopledger_db::{Database, DbConfig, ProductRepository};
//!
//! let db = Database::new(DbConfig::new("ledger.db")).await?;
//!
//! let products = db.products().list_active().await?;
//!
//! let mut tx = db.begin().await?;
//! ProductRepository::apply_stock_delta(&mut *tx, &id, -1, now).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbTransaction};

pub use repository::{
    generate_id, LogRepository, MovementRepository, PettyCashRepository, ProductRepository,
    ServiceOrderRepository, TransactionRepository, UserRepository,
};
