//! # Validation Module
//!
//! Input validation for engine payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Façade                                                        │
//! │  └── Deserialization (types, required JSON fields)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine                                                        │
//! │  └── THIS MODULE: field rules, run before any transaction begins        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                           │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopledger_core::validation::{validate_product_name, validate_quantity};
//!
//! assert!(validate_product_name("Ecrã Samsung A10").is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewPettyCash, NewProduct, NewServiceOrder, NewTransaction, ProductPatch};
use crate::{MAX_DESCRIPTION_LEN, MAX_LABEL_LEN, MAX_PRODUCT_NAME_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required, bounded text field.
///
/// Length is measured in characters, not bytes ("Ecrã" is 4).
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional bounded text field.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a product name (required, at most 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_PRODUCT_NAME_LEN)
}

/// Validates an identifier as a UUID.
///
/// ```rust
/// use shopledger_core::validation::validate_uuid;
///
/// assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("id", "admin").is_err());
/// ```
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(value.trim()).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a movement or part quantity (> 0).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a non-negative integer field (prices, stock levels).
pub fn validate_non_negative(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a strictly positive amount in cents.
pub fn validate_positive_amount(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a product registration payload.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_optional_text("category", Some(&product.category), MAX_LABEL_LEN)?;
    validate_non_negative("price", product.price_cents)?;
    validate_non_negative("cost_price", product.cost_cents)?;
    validate_non_negative("stock", product.stock)?;
    validate_non_negative("min_stock", product.min_stock)?;
    Ok(())
}

/// Validates a partial product update.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_product_name(name)?;
    }
    validate_optional_text("category", patch.category.as_deref(), MAX_LABEL_LEN)?;
    if let Some(price) = patch.price_cents {
        validate_non_negative("price", price)?;
    }
    if let Some(cost) = patch.cost_cents {
        validate_non_negative("cost_price", cost)?;
    }
    if let Some(stock) = patch.stock {
        validate_non_negative("stock", stock)?;
    }
    if let Some(min_stock) = patch.min_stock {
        validate_non_negative("min_stock", min_stock)?;
    }
    Ok(())
}

/// Validates the header fields of a service order.
pub fn validate_new_service_order(order: &NewServiceOrder) -> ValidationResult<()> {
    validate_required_text("client_name", &order.client_name, MAX_LABEL_LEN)?;
    validate_required_text("device_model", &order.device_model, MAX_LABEL_LEN)?;
    validate_optional_text("description", order.description.as_deref(), MAX_DESCRIPTION_LEN)?;
    validate_non_negative("price", order.price_cents)?;
    Ok(())
}

/// Validates a manual ledger entry.
pub fn validate_new_transaction(tx: &NewTransaction) -> ValidationResult<()> {
    validate_positive_amount("amount", tx.amount_cents)?;
    if let Some(cost) = tx.cost_amount_cents {
        validate_non_negative("cost_amount", cost)?;
    }
    validate_required_text("description", &tx.description, MAX_DESCRIPTION_LEN)?;
    validate_required_text("category", &tx.category, MAX_LABEL_LEN)?;
    Ok(())
}

/// Validates a petty cash entry.
pub fn validate_new_petty_cash(entry: &NewPettyCash) -> ValidationResult<()> {
    validate_positive_amount("amount", entry.amount_cents)?;
    validate_required_text("description", &entry.description, MAX_DESCRIPTION_LEN)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
