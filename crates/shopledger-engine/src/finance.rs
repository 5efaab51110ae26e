//! # Finance Ledger
//!
//! Manual income and expense entries, the dashboard figures, and the
//! petty cash box (kept apart from the main ledger).

use chrono::{DateTime, NaiveTime, Utc};
use tracing::info;

use shopledger_core::validation::{validate_new_petty_cash, validate_new_transaction};
use shopledger_core::{
    financial_summary, FinancialSummary, Money, NewPettyCash, NewTransaction, PettyCashEntry,
    PettyCashType, Transaction, TransactionType,
};
use shopledger_db::{generate_id, DbError, PettyCashRepository, TransactionRepository};

use crate::audit;
use crate::context::EngineContext;
use crate::error::EngineResult;
use crate::notify::Entity;

#[derive(Debug, Clone)]
pub struct FinanceEngine {
    ctx: EngineContext,
}

impl FinanceEngine {
    pub(crate) fn new(ctx: EngineContext) -> Self {
        FinanceEngine { ctx }
    }

    /// Records a manual ledger entry. Paid expenses go through the balance
    /// guard when it is enforced.
    pub async fn record_transaction(
        &self,
        actor_id: Option<&str>,
        new_transaction: NewTransaction,
    ) -> EngineResult<Transaction> {
        validate_new_transaction(&new_transaction)?;

        let actor = self.ctx.resolve_actor(actor_id).await;
        let now = self.ctx.now();

        let transaction = Transaction {
            id: generate_id(),
            transaction_type: new_transaction.transaction_type,
            amount_cents: new_transaction.amount_cents,
            cost_amount_cents: new_transaction.cost_amount_cents,
            category: new_transaction.category.trim().to_string(),
            status: new_transaction.status,
            description: new_transaction.description.trim().to_string(),
            client_name: new_transaction.client_name,
            payment_method: new_transaction.payment_method,
            service_order_id: None,
            date: new_transaction.date.unwrap_or(now),
            due_date: new_transaction.due_date.unwrap_or(now),
        };

        let mut tx = self.ctx.db.begin_immediate().await?;
        if transaction.transaction_type == TransactionType::Expense && transaction.is_paid() {
            self.ctx.ensure_balance(&mut tx, transaction.amount()).await?;
        }
        TransactionRepository::insert(&mut *tx, &transaction).await?;
        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            transaction_id = %transaction.id,
            kind = ?transaction.transaction_type,
            amount = %transaction.amount(),
            "Transaction recorded"
        );

        let label = match transaction.transaction_type {
            TransactionType::Income => "entrada",
            TransactionType::Expense => "saída",
        };
        self.ctx
            .audit(
                actor.as_deref(),
                audit::FINANCE_CREATE,
                audit::FINANCE,
                format!(
                    "Registrou {} de {}: {}",
                    label,
                    transaction.amount(),
                    transaction.description
                ),
            )
            .await;
        self.ctx.emit(Entity::Transactions, "create");

        Ok(transaction)
    }

    /// Ledger entries, newest first. All of them when `limit` is `None`.
    pub async fn list_transactions(&self, limit: Option<u32>) -> EngineResult<Vec<Transaction>> {
        Ok(self.ctx.db.transactions().list(limit).await?)
    }

    /// Paid income minus paid expense.
    pub async fn current_balance(&self) -> EngineResult<Money> {
        let cents = TransactionRepository::balance_cents(self.ctx.db.pool()).await?;
        Ok(Money::from_cents(cents))
    }

    /// Dashboard figures as of `now`. "Today" starts at midnight UTC.
    pub async fn financial_summary(&self, now: DateTime<Utc>) -> EngineResult<FinancialSummary> {
        let products = self.ctx.db.products().list_active().await?;
        let transactions = self.ctx.db.transactions().list(None).await?;
        let services = self.ctx.db.service_orders().list().await?;

        let today_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();

        Ok(financial_summary(&products, &transactions, &services, today_start))
    }

    // -------------------------------------------------------------------------
    // Petty cash
    // -------------------------------------------------------------------------

    pub async fn record_petty_cash(
        &self,
        actor_id: Option<&str>,
        new_entry: NewPettyCash,
    ) -> EngineResult<PettyCashEntry> {
        validate_new_petty_cash(&new_entry)?;

        let actor = self.ctx.resolve_actor(actor_id).await;

        let entry = PettyCashEntry {
            id: generate_id(),
            entry_type: new_entry.entry_type,
            amount_cents: new_entry.amount_cents,
            description: new_entry.description.trim().to_string(),
            date: self.ctx.now(),
        };
        PettyCashRepository::insert(self.ctx.db.pool(), &entry).await?;

        info!(entry_id = %entry.id, kind = ?entry.entry_type, amount_cents = entry.amount_cents, "Petty cash recorded");

        let label = match entry.entry_type {
            PettyCashType::Deposit => "depósito",
            PettyCashType::Expense => "despesa",
        };
        self.ctx
            .audit(
                actor.as_deref(),
                audit::PETTY_CASH_CREATE,
                audit::FINANCE,
                format!(
                    "Registrou {} no caixa interno: {} - {}",
                    label,
                    Money::from_cents(entry.amount_cents),
                    entry.description
                ),
            )
            .await;
        self.ctx.emit(Entity::PettyCash, "create");

        Ok(entry)
    }

    /// Petty cash entries, newest first.
    pub async fn list_petty_cash(&self) -> EngineResult<Vec<PettyCashEntry>> {
        Ok(self.ctx.db.petty_cash().list().await?)
    }

    /// Deposits minus expenses.
    pub async fn petty_cash_balance(&self) -> EngineResult<Money> {
        Ok(Money::from_cents(self.ctx.db.petty_cash().balance_cents().await?))
    }
}
