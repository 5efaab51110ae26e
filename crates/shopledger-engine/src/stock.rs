//! # Stock Adjustment Engine
//!
//! Explicit entries and exits against a product's stock.
//!
//! ## One adjustment, one database transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve actor                      (outside the transaction)           │
//! │       │                                                                 │
//! │  BEGIN IMMEDIATE                     (waits for the write lock)         │
//! │   1. UPDATE products SET stock = stock + Δ, status = ...                │
//! │        WHERE id = ? AND stock + Δ >= 0          ── no row ──► ROLLBACK  │
//! │   2. ledger amount (refused on overflow), balance guard if enforced     │
//! │   3. INSERT stock_movements                                             │
//! │   4. INSERT transactions  (exit → income, entry+financial → expense)    │
//! │  COMMIT                                                                 │
//! │       │                                                                 │
//! │  audit · invalidate analytics · broadcast   (best effort)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The unit holds the store's write lock from `BEGIN`, so competing
//! adjustments serialize and a losing exit sees the post-state stock.

use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;

use shopledger_core::stock::{adjustment_entry, adjustment_reason, insufficient_stock, MovementDraft};
use shopledger_core::{
    CoreError, Product, StockAdjustment, StockMovement, Transaction, TransactionStatus,
    TransactionType,
};
use shopledger_db::{DbError, MovementRepository, ProductRepository, TransactionRepository};

use crate::audit;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::notify::Entity;

/// What a committed adjustment wrote.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct StockAdjustmentResult {
    pub product: Product,
    pub movement: StockMovement,
    pub transaction: Option<Transaction>,
}

/// Stock adjustments and the product lifecycle.
#[derive(Debug, Clone)]
pub struct StockEngine {
    pub(crate) ctx: EngineContext,
}

impl StockEngine {
    pub(crate) fn new(ctx: EngineContext) -> Self {
        StockEngine { ctx }
    }

    /// Adds or removes stock, recording the movement and, for exits and
    /// financial entries, the ledger entry.
    pub async fn adjust_stock(
        &self,
        actor_id: Option<&str>,
        adjustment: StockAdjustment,
    ) -> EngineResult<StockAdjustmentResult> {
        let StockAdjustment {
            product_id,
            direction,
            quantity,
            reason,
            record_financial,
        } = adjustment;

        debug!(product_id = %product_id, %direction, quantity, "adjust_stock");

        if quantity <= 0 {
            return Err(CoreError::InvalidQuantity(quantity).into());
        }

        let actor = self.ctx.resolve_actor(actor_id).await;
        let now = self.ctx.now();
        let delta = direction.signed(quantity);

        let mut tx = self.ctx.db.begin_immediate().await?;

        let product = match ProductRepository::apply_stock_delta(&mut *tx, &product_id, delta, now)
            .await?
        {
            Some(product) => product,
            None => {
                return Err(match ProductRepository::find_active(&mut *tx, &product_id).await? {
                    Some(current) => insufficient_stock(&current, quantity).into(),
                    None => CoreError::ProductNotFound(product_id).into(),
                });
            }
        };

        let draft = adjustment_entry(
            &product,
            direction,
            quantity,
            reason.as_deref(),
            record_financial,
        )?;
        if let Some(expense) = draft
            .as_ref()
            .filter(|d| d.transaction_type == TransactionType::Expense)
        {
            self.ctx.ensure_balance(&mut tx, expense.amount).await?;
        }

        let reason = adjustment_reason(direction, reason.as_deref());
        let movement = self.ctx.movement(
            &product.id,
            actor.as_deref(),
            MovementDraft {
                movement_type: direction,
                quantity,
                reason: reason.clone(),
            },
            now,
        );
        MovementRepository::insert(&mut *tx, &movement).await?;

        let transaction = match draft {
            Some(draft) => {
                let entry = self.ctx.ledger_entry(draft, TransactionStatus::Paid, now);
                TransactionRepository::insert(&mut *tx, &entry).await?;
                Some(entry)
            }
            None => None,
        };

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            product_id = %product.id,
            %direction,
            quantity,
            stock = product.stock,
            financial = transaction.is_some(),
            "Stock adjusted"
        );

        self.ctx
            .audit(
                actor.as_deref(),
                audit::STOCK_ADJUST,
                audit::INVENTORY,
                format!(
                    "Ajuste de estoque ({:+}) em {} - Motivo: {}",
                    delta, product.name, reason
                ),
            )
            .await;
        self.ctx.invalidate_analytics();
        self.ctx.emit(Entity::Products, "adjust-stock");
        if transaction.is_some() {
            self.ctx.emit(Entity::Transactions, "create");
        }

        Ok(StockAdjustmentResult {
            product,
            movement,
            transaction,
        })
    }

    /// Movement history, newest first. All products when `product_id` is `None`.
    pub async fn list_movements(&self, product_id: Option<&str>) -> EngineResult<Vec<StockMovement>> {
        Ok(self.ctx.db.movements().list(product_id).await?)
    }
}
