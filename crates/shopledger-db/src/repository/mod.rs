//! # Repository Module
//!
//! Database repository implementations for ShopLedger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways Into a Repository                           │
//! │                                                                         │
//! │  Reads outside any transaction:                                        │
//! │       db.products().list_active().await                                │
//! │       (methods on &self, run on the pool)                              │
//! │                                                                         │
//! │  Writes inside an atomic unit:                                         │
//! │       let mut tx = db.begin().await?;                                  │
//! │       ProductRepository::apply_stock_delta(&mut *tx, id, -3, now)      │
//! │       MovementRepository::insert(&mut *tx, &movement)                  │
//! │       tx.commit().await?;                                              │
//! │       (associated fns generic over sqlx::Executor)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Never call a `&self` method while holding an open transaction: the
//! in-memory pool has a single connection.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Products, guarded stock deltas, soft delete
//! - [`MovementRepository`] - Append-only stock movements
//! - [`TransactionRepository`] - Ledger entries and cash balance
//! - [`ServiceOrderRepository`] - Service orders and their part lines
//! - [`PettyCashRepository`] - Internal cash box
//! - [`UserRepository`] - Staff records for actor resolution
//! - [`LogRepository`] - Audit feed

pub mod log;
pub mod movement;
pub mod petty_cash;
pub mod product;
pub mod service;
pub mod transaction;
pub mod user;

pub use log::LogRepository;
pub use movement::MovementRepository;
pub use petty_cash::PettyCashRepository;
pub use product::ProductRepository;
pub use service::ServiceOrderRepository;
pub use transaction::TransactionRepository;
pub use user::UserRepository;

/// Generates a new entity ID (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
