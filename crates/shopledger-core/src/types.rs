//! # Domain Types
//!
//! Entities and request payloads shared by every layer of ShopLedger.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐ 1   * ┌───────────────┐                               │
//! │  │   Product    │──────►│ StockMovement │  append-only, never cascaded  │
//! │  │ stock ≥ 0    │       │ entry | exit  │                               │
//! │  └──────┬───────┘       └───────────────┘                               │
//! │         │ referenced by                                                 │
//! │  ┌──────▼───────┐ 1   * ┌───────────────┐      ┌───────────────────┐   │
//! │  │ ServicePart  │◄──────│ ServiceOrder  │─────►│   Transaction     │   │
//! │  │ unit snapshot│       │ pending → ... │ 0..1 │ income | expense  │   │
//! │  └──────────────┘       └───────────────┘      └───────────────────┘   │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                │
//! │  │  PettyCash   │   │  SystemLog   │   │    User      │                │
//! │  │  (isolated)  │   │ (audit feed) │   │ admin|staff  │                │
//! │  └──────────────┘   └──────────────┘   └──────────────┘                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are stored as raw `*_cents` integers (so they map 1:1 to
//! SQLite columns) with `Money` accessors for arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// Stock-derived availability of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    OutOfStock,
}

impl ProductStatus {
    /// Status is a pure function of stock: `active` iff stock > 0.
    #[inline]
    pub const fn for_stock(stock: i64) -> Self {
        if stock > 0 {
            ProductStatus::Active
        } else {
            ProductStatus::OutOfStock
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::OutOfStock => "out_of_stock",
        }
    }
}

/// A stocked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    pub category: String,

    /// Sale unit price in cents.
    pub price_cents: i64,

    /// Unit cost in cents.
    pub cost_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Reorder threshold.
    pub min_stock: i64,

    pub status: ProductStatus,

    /// Soft-delete flag. Deleted products keep their history.
    pub is_deleted: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// True when stock has reached the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }

    /// Stock valued at sale price.
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.stock)
    }

    /// Stock valued at cost.
    pub fn stock_cost(&self) -> Money {
        self.cost().multiply_quantity(self.stock)
    }
}

/// Payload for registering a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub cost_cents: i64,
    /// Initial stock. A positive value is recorded as an initial entry.
    pub stock: i64,
    pub min_stock: i64,
}

/// Partial product update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    /// Target stock level. A change is recorded as a manual adjustment.
    pub stock: Option<i64>,
    pub min_stock: Option<i64>,
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Direction of a stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Stock added.
    Entry,
    /// Stock removed.
    Exit,
}

impl MovementType {
    /// Applies the direction's sign to a positive quantity.
    #[inline]
    pub const fn signed(&self, quantity: i64) -> i64 {
        match self {
            MovementType::Entry => quantity,
            MovementType::Exit => -quantity,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "entry",
            MovementType::Exit => "exit",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of one stock change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,

    pub product_id: String,

    /// Resolved actor. `None` when no actor could be resolved.
    pub user_id: Option<String>,

    #[serde(rename = "type")]
    pub movement_type: MovementType,

    /// Always positive; direction carries the sign.
    pub quantity: i64,

    pub reason: String,

    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

impl StockMovement {
    /// Quantity with the direction's sign applied.
    #[inline]
    pub fn signed_quantity(&self) -> i64 {
        self.movement_type.signed(self.quantity)
    }
}

/// Payload for an explicit stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockAdjustment {
    pub product_id: String,
    pub direction: MovementType,
    pub quantity: i64,
    /// Blank or missing falls back to the direction's default reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Record an expense for entries. Exits always record income.
    #[serde(default)]
    pub record_financial: bool,
}

// =============================================================================
// Financial Transaction
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Paid
    }
}

/// An income or expense entry in the main ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    pub amount_cents: i64,

    /// Cost-of-goods portion of an income entry.
    pub cost_amount_cents: Option<i64>,

    pub category: String,

    pub status: TransactionStatus,

    pub description: String,

    pub client_name: Option<String>,

    pub payment_method: Option<String>,

    /// Originating service order, if any.
    pub service_order_id: Option<String>,

    #[ts(as = "String")]
    pub date: DateTime<Utc>,

    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn cost_amount(&self) -> Money {
        Money::from_cents(self.cost_amount_cents.unwrap_or(0))
    }

    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Paid
    }
}

/// Payload for a manual ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount_cents: i64,
    #[serde(default)]
    pub cost_amount_cents: Option<i64>,
    pub category: String,
    #[serde(default)]
    pub status: TransactionStatus,
    pub description: String,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub date: Option<DateTime<Utc>>,
    /// Defaults to now.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub due_date: Option<DateTime<Utc>>,
}

// =============================================================================
// Service Orders
// =============================================================================

/// Lifecycle of a repair order. `Delivered` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Pending,
    InProgress,
    Delivered,
}

impl Default for ServiceStatus {
    fn default() -> Self {
        ServiceStatus::Pending
    }
}

impl ServiceStatus {
    /// Whether an order in this status may move to `next`.
    pub fn can_transition_to(&self, next: ServiceStatus) -> bool {
        match (self, next) {
            (ServiceStatus::Delivered, ServiceStatus::Delivered) => true,
            (ServiceStatus::Delivered, _) => false,
            _ => true,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Pending => "pending",
            ServiceStatus::InProgress => "in_progress",
            ServiceStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A repair job for a client device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ServiceOrder {
    pub id: String,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub device_model: String,
    pub description: Option<String>,
    pub status: ServiceStatus,
    /// Price charged to the client.
    pub price_cents: i64,
    /// Σ unit cost × quantity over the consumed parts.
    pub cost_cents: i64,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl ServiceOrder {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

/// A product consumed by a service order.
///
/// Unit price and cost are snapshots taken when the part was used; later
/// product repricing never changes historical order cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ServicePart {
    pub id: String,
    pub service_order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub unit_cost_cents: i64,
}

impl ServicePart {
    /// `unit_cost × quantity`. `None` when it does not fit in cents.
    pub fn line_cost(&self) -> Option<Money> {
        Money::from_cents(self.unit_cost_cents).checked_multiply_quantity(self.quantity)
    }
}

/// A service order together with its part lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceOrderWithParts {
    #[serde(flatten)]
    pub order: ServiceOrder,
    pub parts: Vec<ServicePart>,
}

/// Payload for opening a service order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewServiceOrder {
    pub client_name: String,
    #[serde(default)]
    pub client_phone: Option<String>,
    pub device_model: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ServiceStatus,
    pub price_cents: i64,
    #[serde(default)]
    pub front_image_url: Option<String>,
    #[serde(default)]
    pub back_image_url: Option<String>,
}

/// One requested part line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PartRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Partial service order update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceOrderPatch {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    pub device_model: Option<String>,
    pub description: Option<String>,
    pub status: Option<ServiceStatus>,
    pub price_cents: Option<i64>,
    pub front_image_url: Option<String>,
    pub back_image_url: Option<String>,
}

impl ServiceOrderPatch {
    /// True when the patch touches fields mirrored on the linked transaction.
    pub fn changes_billing_details(&self) -> bool {
        self.client_name.is_some() || self.device_model.is_some() || self.price_cents.is_some()
    }
}

// =============================================================================
// Petty Cash
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PettyCashType {
    Deposit,
    Expense,
}

/// An entry in the internal cash box. Isolated from the main ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PettyCashEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub entry_type: PettyCashType,
    pub amount_cents: i64,
    pub description: String,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
}

impl PettyCashEntry {
    /// Amount with deposits positive and expenses negative.
    pub fn signed_amount(&self) -> Money {
        match self.entry_type {
            PettyCashType::Deposit => Money::from_cents(self.amount_cents),
            PettyCashType::Expense => -Money::from_cents(self.amount_cents),
        }
    }
}

/// Payload for a petty cash entry.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPettyCash {
    #[serde(rename = "type")]
    pub entry_type: PettyCashType,
    pub amount_cents: i64,
    pub description: String,
}

// =============================================================================
// Users & Audit
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Staff,
}

/// A staff member. Only used for actor attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Append-only audit feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SystemLog {
    pub id: String,
    pub user_id: Option<String>,
    /// e.g. `STOCK_ADJUST`.
    pub action: String,
    /// e.g. `INVENTORY`.
    pub category: String,
    pub details: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_stock() {
        assert_eq!(ProductStatus::for_stock(3), ProductStatus::Active);
        assert_eq!(ProductStatus::for_stock(0), ProductStatus::OutOfStock);
    }

    #[test]
    fn test_signed_quantity() {
        assert_eq!(MovementType::Entry.signed(4), 4);
        assert_eq!(MovementType::Exit.signed(4), -4);
    }

    #[test]
    fn test_delivered_is_terminal() {
        assert!(ServiceStatus::Pending.can_transition_to(ServiceStatus::Delivered));
        assert!(ServiceStatus::InProgress.can_transition_to(ServiceStatus::Pending));
        assert!(!ServiceStatus::Delivered.can_transition_to(ServiceStatus::InProgress));
        assert!(ServiceStatus::Delivered.can_transition_to(ServiceStatus::Delivered));
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_string(&ServiceStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let json = serde_json::to_string(&ProductStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"out_of_stock\"");

        let adjustment: StockAdjustment = serde_json::from_str(
            r#"{"product_id":"p","direction":"exit","quantity":2}"#,
        )
        .unwrap();
        assert_eq!(adjustment.direction, MovementType::Exit);
        assert!(!adjustment.record_financial);
        assert!(adjustment.reason.is_none());
    }

    #[test]
    fn test_petty_cash_sign() {
        let entry = PettyCashEntry {
            id: "x".into(),
            entry_type: PettyCashType::Expense,
            amount_cents: 250,
            description: "Água".into(),
            date: Utc::now(),
        };
        assert_eq!(entry.signed_amount().cents(), -250);
    }
}
