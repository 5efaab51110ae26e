//! # Financial Summary
//!
//! Dashboard figures derived from products, ledger entries and service
//! orders. Only `paid` entries count as realized flow.
//!
//! ## Income / Expense Buckets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  paid income ──┬── "Venda de Produto"   → product_revenue              │
//! │                ├── "Serviço de Reparo"  → service_revenue              │
//! │                └── anything else        → other_income                 │
//! │                     Σ cost_amount       → cogs                         │
//! │                                                                         │
//! │  paid expense ─┬── "Compra de Estoque"  → stock_investment             │
//! │                └── anything else        → operating_expenses           │
//! │                                                                         │
//! │  balance    = total_income − operating_expenses − stock_investment     │
//! │  net_profit = total_income − operating_expenses − cogs                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, ServiceOrder, ServiceStatus, Transaction, TransactionType};
use crate::{CATEGORY_PRODUCT_SALE, CATEGORY_REPAIR_SERVICE, CATEGORY_STOCK_PURCHASE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FinancialSummary {
    /// Σ price × stock over non-deleted products.
    pub inventory_value: Money,
    /// Σ cost × stock over non-deleted products.
    pub inventory_cost_value: Money,

    pub total_income: Money,
    pub product_revenue: Money,
    pub service_revenue: Money,
    pub other_income: Money,

    /// Paid expenses other than stock purchases.
    pub operating_expenses: Money,
    pub stock_investment: Money,
    pub cogs: Money,

    pub balance: Money,
    pub net_profit: Money,

    pub today_income: Money,
    pub today_product_revenue: Money,
    pub today_service_revenue: Money,
    pub today_net_profit: Money,

    pub active_products: usize,
    pub total_products: usize,
    pub low_stock_products: usize,

    /// Orders not yet delivered.
    pub pending_services: usize,
    pub completed_services: usize,
    pub total_services: usize,
}

#[derive(Default)]
struct Flow {
    income: Money,
    product_revenue: Money,
    service_revenue: Money,
    other_income: Money,
    operating_expenses: Money,
    stock_investment: Money,
    cogs: Money,
}

impl Flow {
    fn add(&mut self, tx: &Transaction) {
        match tx.transaction_type {
            TransactionType::Income => {
                self.income += tx.amount();
                self.cogs += tx.cost_amount();
                match tx.category.as_str() {
                    CATEGORY_PRODUCT_SALE => self.product_revenue += tx.amount(),
                    CATEGORY_REPAIR_SERVICE => self.service_revenue += tx.amount(),
                    _ => self.other_income += tx.amount(),
                }
            }
            TransactionType::Expense if tx.category == CATEGORY_STOCK_PURCHASE => {
                self.stock_investment += tx.amount();
            }
            TransactionType::Expense => self.operating_expenses += tx.amount(),
        }
    }

    fn net_profit(&self) -> Money {
        self.income - self.operating_expenses - self.cogs
    }
}

/// Computes the dashboard figures.
///
/// `products` should already exclude soft-deleted rows. "Today" means
/// entries dated at or after `today_start`.
pub fn financial_summary(
    products: &[Product],
    transactions: &[Transaction],
    services: &[ServiceOrder],
    today_start: DateTime<Utc>,
) -> FinancialSummary {
    let mut all = Flow::default();
    let mut today = Flow::default();

    for tx in transactions.iter().filter(|t| t.is_paid()) {
        all.add(tx);
        if tx.date >= today_start {
            today.add(tx);
        }
    }

    let completed_services = services
        .iter()
        .filter(|s| s.status == ServiceStatus::Delivered)
        .count();

    FinancialSummary {
        inventory_value: products.iter().map(Product::stock_value).sum(),
        inventory_cost_value: products.iter().map(Product::stock_cost).sum(),

        total_income: all.income,
        product_revenue: all.product_revenue,
        service_revenue: all.service_revenue,
        other_income: all.other_income,
        operating_expenses: all.operating_expenses,
        stock_investment: all.stock_investment,
        cogs: all.cogs,
        balance: all.income - all.operating_expenses - all.stock_investment,
        net_profit: all.net_profit(),

        today_income: today.income,
        today_product_revenue: today.product_revenue,
        today_service_revenue: today.service_revenue,
        today_net_profit: today.net_profit(),

        active_products: products.iter().filter(|p| p.stock > 0).count(),
        total_products: products.len(),
        low_stock_products: products.iter().filter(|p| p.is_low_stock()).count(),

        pending_services: services.len() - completed_services,
        completed_services,
        total_services: services.len(),
    }
}
