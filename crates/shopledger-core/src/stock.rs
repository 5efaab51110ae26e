//! # Stock Rules
//!
//! Pure rules behind every stock change: movement reasons, checked amounts,
//! and the financial entry (if any) a change produces. The engines apply
//! these inside a single database transaction.
//!
//! ## Which change produces what
//! ```text
//! ┌──────────────────────────┬───────────┬─────────────────────────────────┐
//! │ Operation                │ Movement  │ Transaction                     │
//! ├──────────────────────────┼───────────┼─────────────────────────────────┤
//! │ adjust_stock(exit)       │ exit      │ income  price×qty, COGS cost×qty│
//! │ adjust_stock(entry, fin) │ entry     │ expense cost×qty                │
//! │ adjust_stock(entry)      │ entry     │ none                            │
//! │ create_product(stock>0)  │ entry     │ expense cost×stock (if > 0)     │
//! │ update_product(stock)    │ entry/exit│ none (manual edit)              │
//! │ service order part       │ exit      │ one income per order            │
//! └──────────────────────────┴───────────┴─────────────────────────────────┘
//! ```
//!
//! Manual edits through `update_product` never touch the ledger. Financial
//! tracking is reserved for the explicit adjustment operation; this
//! asymmetry is deliberate and kept.

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::types::{MovementType, Product, StockMovement, TransactionType};
use crate::{CATEGORY_PRODUCT_SALE, CATEGORY_REPAIR_SERVICE, CATEGORY_STOCK_PURCHASE};

// =============================================================================
// Movement Reasons
// =============================================================================

pub const REASON_DEFAULT_EXIT: &str = "Venda/Saída";
pub const REASON_DEFAULT_ENTRY: &str = "Entrada/Ajuste";
pub const REASON_INITIAL_STOCK: &str = "Entrada Inicial (Cadastro)";
pub const REASON_MANUAL_ENTRY: &str = "Ajuste Manual (Entrada)";
pub const REASON_MANUAL_EXIT: &str = "Ajuste Manual (Saída)";

/// Reason fragments that mark a movement as a correction rather than a sale.
pub const MANUAL_ADJUSTMENT_MARKERS: [&str; 3] = ["Ajuste", "Manual", "Correction"];

/// True when the reason tags a manual or corrective adjustment.
///
/// ```rust
/// use shopledger_core::stock::is_manual_adjustment;
///
/// assert!(is_manual_adjustment("Ajuste Manual (Saída)"));
/// assert!(!is_manual_adjustment("Venda/Saída"));
/// ```
pub fn is_manual_adjustment(reason: &str) -> bool {
    MANUAL_ADJUSTMENT_MARKERS.iter().any(|m| reason.contains(m))
}

/// Supplied reason, or the direction's default when blank.
pub fn adjustment_reason(direction: MovementType, supplied: Option<&str>) -> String {
    match supplied.map(str::trim) {
        Some(r) if !r.is_empty() => r.to_string(),
        _ => match direction {
            MovementType::Exit => REASON_DEFAULT_EXIT.to_string(),
            MovementType::Entry => REASON_DEFAULT_ENTRY.to_string(),
        },
    }
}

/// Reason for parts consumed by a service order.
pub fn service_consumption_reason(device_model: &str, client_name: &str) -> String {
    format!("Uso em Serviço: {} ({})", device_model, client_name)
}

// =============================================================================
// Stock Arithmetic
// =============================================================================

/// Builds the error for an exit the product cannot cover.
pub fn insufficient_stock(product: &Product, requested: i64) -> CoreError {
    CoreError::InsufficientStock {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        available: product.stock,
        requested,
    }
}

/// Sum of signed movement quantities.
///
/// For a product whose every stock change went through the engines this
/// equals its current stock.
pub fn net_quantity<'a>(movements: impl IntoIterator<Item = &'a StockMovement>) -> i64 {
    movements.into_iter().map(StockMovement::signed_quantity).sum()
}

/// A movement about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementDraft {
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
}

/// Movement for a direct stock edit from `old` to `new`, if they differ.
pub fn manual_edit(old_stock: i64, new_stock: i64) -> Option<MovementDraft> {
    let delta = new_stock - old_stock;
    if delta == 0 {
        return None;
    }
    let (movement_type, reason) = if delta > 0 {
        (MovementType::Entry, REASON_MANUAL_ENTRY)
    } else {
        (MovementType::Exit, REASON_MANUAL_EXIT)
    };
    Some(MovementDraft {
        movement_type,
        quantity: delta.abs(),
        reason: reason.to_string(),
    })
}

/// Movement for stock present at registration, if any.
pub fn initial_stock(stock: i64) -> Option<MovementDraft> {
    (stock > 0).then(|| MovementDraft {
        movement_type: MovementType::Entry,
        quantity: stock,
        reason: REASON_INITIAL_STOCK.to_string(),
    })
}

// =============================================================================
// Derived Financial Entries
// =============================================================================

/// A ledger entry about to be recorded alongside a stock change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancialDraft {
    pub transaction_type: TransactionType,
    pub amount: Money,
    pub cost_amount: Option<Money>,
    pub category: &'static str,
    pub description: String,
}

/// `unit × quantity`, refused when it does not fit in cents.
pub fn line_amount(field: &str, unit: Money, quantity: i64) -> Result<Money, ValidationError> {
    unit.checked_multiply_quantity(quantity)
        .ok_or_else(|| amount_out_of_range(field))
}

/// Error for a ledger amount too large to record.
pub fn amount_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

/// Ledger entry for an explicit adjustment.
///
/// Exits always map to income (price × qty, COGS cost × qty). Entries map
/// to an expense (cost × qty) only when `record_financial` is set.
pub fn adjustment_entry(
    product: &Product,
    direction: MovementType,
    quantity: i64,
    reason: Option<&str>,
    record_financial: bool,
) -> Result<Option<FinancialDraft>, ValidationError> {
    if direction == MovementType::Entry && !record_financial {
        return Ok(None);
    }

    let supplied = reason.map(str::trim).filter(|r| !r.is_empty());
    let draft = match direction {
        MovementType::Exit => FinancialDraft {
            transaction_type: TransactionType::Income,
            amount: line_amount("amount", product.price(), quantity)?,
            cost_amount: Some(line_amount("cost_amount", product.cost(), quantity)?),
            category: CATEGORY_PRODUCT_SALE,
            description: supplied
                .map(str::to_string)
                .unwrap_or_else(|| format!("Venda: {} ({} un)", product.name, quantity)),
        },
        MovementType::Entry => FinancialDraft {
            transaction_type: TransactionType::Expense,
            amount: line_amount("amount", product.cost(), quantity)?,
            cost_amount: None,
            category: CATEGORY_STOCK_PURCHASE,
            description: supplied.map(str::to_string).unwrap_or_else(|| {
                format!("Compra de Estoque: {} ({} un)", product.name, quantity)
            }),
        },
    };
    Ok(Some(draft))
}

/// Expense for stock present at registration. `None` when it costs nothing.
pub fn initial_investment(
    name: &str,
    unit_cost: Money,
    stock: i64,
) -> Result<Option<FinancialDraft>, ValidationError> {
    let amount = line_amount("amount", unit_cost, stock)?;
    Ok(amount.is_positive().then(|| FinancialDraft {
        transaction_type: TransactionType::Expense,
        amount,
        cost_amount: None,
        category: CATEGORY_STOCK_PURCHASE,
        description: format!("Investimento Inicial: {} ({} un)", name, stock),
    }))
}

/// Description mirrored on a service order's income entry.
pub fn service_description(device_model: &str, client_name: &str) -> String {
    format!("Serviço: {} - {}", device_model, client_name)
}

/// Income for a service order. `None` for free services.
pub fn service_income(
    device_model: &str,
    client_name: &str,
    price: Money,
    parts_cost: Money,
) -> Option<FinancialDraft> {
    price.is_positive().then(|| FinancialDraft {
        transaction_type: TransactionType::Income,
        amount: price,
        cost_amount: Some(parts_cost),
        category: CATEGORY_REPAIR_SERVICE,
        description: service_description(device_model, client_name),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
