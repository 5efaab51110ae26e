//! # Error Types
//!
//! Domain-specific error types for shopledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopledger-core (this file)                                           │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed or missing input                     │
//! │                                                                         │
//! │  shopledger-db                                                         │
//! │  └── DbError          - Persistence failures                           │
//! │                                                                         │
//! │  shopledger-engine                                                     │
//! │  └── EngineError      - Core | Store | Config, mapped to ErrorKind     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ErrorResponse       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the engines.
///
/// Every variant is recoverable by the caller: nothing has been written
/// when one of these is returned.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product does not exist or has been soft-deleted.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Service order does not exist.
    #[error("Service order not found: {0}")]
    ServiceOrderNotFound(String),

    /// Financial transaction does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Not enough stock to remove the requested quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Exit adjustment (qty: 5)
    ///      │
    ///      ▼
    /// Guarded UPDATE: stock 3 + (-5) < 0 → no row
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Ecrã A10", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Caller retries with a corrected quantity
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: i64,
        requested: i64,
    },

    /// Quantity is zero or negative.
    #[error("Invalid quantity: {0} (must be a positive integer)")]
    InvalidQuantity(i64),

    /// A status change the lifecycle does not allow.
    #[error("Cannot change {entity} status from {from} to {to}")]
    InvalidStatusTransition {
        entity: String,
        from: String,
        to: String,
    },

    /// Paid balance does not cover the expense being recorded.
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Money, required: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any mutation is attempted.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_names_product() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            product_name: "Ecrã A10".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Ecrã A10: available 3, requested 5"
        );
    }

    #[test]
    fn test_insufficient_balance_formats_money() {
        let err = CoreError::InsufficientBalance {
            available: Money::from_cents(1_000),
            required: Money::from_cents(50_000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient balance: available MT 10.00, required MT 500.00"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Negative {
            field: "stock".to_string(),
        };
        assert_eq!(err.to_string(), "stock cannot be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::Required {
            field: "description".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
