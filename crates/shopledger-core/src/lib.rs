//! # shopledger-core: Pure Domain Logic for ShopLedger
//!
//! Everything here is deterministic and free of I/O. The storage layer
//! (`shopledger-db`) persists these types, and the engines
//! (`shopledger-engine`) sequence them into atomic operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ShopLedger Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Client façade (HTTP / mobile wrapper)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ (actor_id, payload)                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shopledger-engine                            │   │
//! │  │   StockEngine · ServiceEngine · AnalyticsEngine · Ledger        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ shopledger-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌───────┐  │   │
//! │  │   │  types  │ │  money  │ │  stock  │ │ analytics │ │ clock │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └───────────┘ └───────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Product, StockMovement, Transaction, ServiceOrder...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`stock`] - Movement reasons, checked ledger amounts, derived financial entries
//! - [`analytics`] - Sales velocity, percentile ranking and classification
//! - [`ledger`] - Financial dashboard figures
//! - [`clock`] - Injectable time source
//!
//! ## Example Usage
//!
//! ```rust
//! use shopledger_core::money::Money;
//! use shopledger_core::types::MovementType;
//!
//! assert_eq!(10 + MovementType::Exit.signed(3), 7);
//!
//! let revenue = Money::from_cents(1_500).checked_multiply_quantity(3).unwrap();
//! assert_eq!(revenue.to_string(), "MT 45.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod clock;
pub mod error;
pub mod ledger;
pub mod money;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{financial_summary, FinancialSummary};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Transaction category for stock purchases (initial investment and entries).
pub const CATEGORY_STOCK_PURCHASE: &str = "Compra de Estoque";

/// Transaction category for product sales recorded by stock exits.
pub const CATEGORY_PRODUCT_SALE: &str = "Venda de Produto";

/// Transaction category for repair services.
pub const CATEGORY_REPAIR_SERVICE: &str = "Serviço de Reparo";

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Maximum length of a category or other short label.
pub const MAX_LABEL_LEN: usize = 100;

/// Maximum length of free-text descriptions and movement reasons.
pub const MAX_DESCRIPTION_LEN: usize = 500;
