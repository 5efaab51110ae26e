//! # Engine Context
//!
//! Shared handles every engine runs against, plus the small steps each
//! operation repeats: resolving the actor, the optional balance guard,
//! building rows from core drafts, and the best-effort post-commit work.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use shopledger_core::stock::{FinancialDraft, MovementDraft};
use shopledger_core::{
    Clock, CoreError, Money, StockMovement, Transaction, TransactionStatus,
};
use shopledger_db::{generate_id, Database, DbTransaction, TransactionRepository};

use crate::actor::ActorResolver;
use crate::audit::AuditSink;
use crate::cache::AnalyticsCache;
use crate::config::LedgerConfig;
use crate::error::EngineResult;
use crate::notify::{ChangeEvent, Entity, Notifier};

#[derive(Debug, Clone)]
pub struct EngineContext {
    pub(crate) db: Database,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) actors: Arc<dyn ActorResolver>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) notifier: Notifier,
    pub(crate) cache: Arc<AnalyticsCache>,
    pub(crate) config: Arc<LedgerConfig>,
}

impl EngineContext {
    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Resolves the acting user. Runs before a transaction is opened.
    pub(crate) async fn resolve_actor(&self, candidate: Option<&str>) -> Option<String> {
        self.actors.resolve(candidate).await
    }

    /// Refuses an expense the paid balance can't cover, when enforced.
    pub(crate) async fn ensure_balance(
        &self,
        tx: &mut DbTransaction,
        required: Money,
    ) -> EngineResult<()> {
        if !self.config.finance.enforce_cash_balance || !required.is_positive() {
            return Ok(());
        }

        let available = Money::from_cents(TransactionRepository::balance_cents(&mut **tx).await?);
        if available < required {
            return Err(CoreError::InsufficientBalance {
                available,
                required,
            }
            .into());
        }
        Ok(())
    }

    pub(crate) fn movement(
        &self,
        product_id: &str,
        actor: Option<&str>,
        draft: MovementDraft,
        date: DateTime<Utc>,
    ) -> StockMovement {
        StockMovement {
            id: generate_id(),
            product_id: product_id.to_string(),
            user_id: actor.map(str::to_string),
            movement_type: draft.movement_type,
            quantity: draft.quantity,
            reason: draft.reason,
            date,
        }
    }

    pub(crate) fn ledger_entry(
        &self,
        draft: FinancialDraft,
        status: TransactionStatus,
        date: DateTime<Utc>,
    ) -> Transaction {
        Transaction {
            id: generate_id(),
            transaction_type: draft.transaction_type,
            amount_cents: draft.amount.cents(),
            cost_amount_cents: draft.cost_amount.map(|c| c.cents()),
            category: draft.category.to_string(),
            status,
            description: draft.description,
            client_name: None,
            payment_method: None,
            service_order_id: None,
            date,
            due_date: date,
        }
    }

    // -------------------------------------------------------------------------
    // Post-commit (best effort)
    // -------------------------------------------------------------------------

    pub(crate) async fn audit(
        &self,
        actor: Option<&str>,
        action: &str,
        category: &str,
        details: String,
    ) {
        if let Err(e) = self.audit.record(actor, action, category, &details).await {
            warn!(error = %e, action, "Audit entry not recorded");
        }
    }

    pub(crate) fn emit(&self, entity: Entity, action: &'static str) {
        self.notifier.emit(ChangeEvent::data_updated(entity, action));
    }

    pub(crate) fn invalidate_analytics(&self) {
        self.cache.invalidate();
    }
}
