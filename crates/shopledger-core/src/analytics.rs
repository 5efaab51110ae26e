//! # Product Analytics
//!
//! Derives per-product health signals from stock movement history.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  (Product, movements) × N                                               │
//! │       │                                                                 │
//! │       ▼  sales_stats()  per product, isolated                           │
//! │  total sales · velocity · recency      (corrupt history → Degraded)     │
//! │       │                                                                 │
//! │       ▼  percentiles()  stable descending sort by total sales           │
//! │  percentile = (N − rank) / N × 100                                      │
//! │       │                                                                 │
//! │       ▼  classify()  first match wins                                   │
//! │  1. recency ≥ 7 days            → no-movement                           │
//! │  2. percentile ≥ 90             → best-seller                           │
//! │  3. percentile ≤ 20 ∧ sales > 0 → low-sales                             │
//! │  4. velocity < 0.5 ∧ sales > 0  → stagnant                              │
//! │  5. otherwise                   → normal                                │
//! │       │                                                                 │
//! │       ▼  summarize()                                                    │
//! │  top 5 by sales · alerts (source order, max 10) · metrics               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales exclude exits whose reason marks a manual correction
//! (see [`crate::stock::is_manual_adjustment`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::stock::is_manual_adjustment;
use crate::types::{MovementType, Product, StockMovement};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Sentinel recency for a product that never moved.
pub const NEVER_MOVED: i64 = -1;

// =============================================================================
// Policy
// =============================================================================

/// Thresholds used by [`classify`] and [`summarize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    /// Days without any movement before a product is `no-movement`.
    pub no_movement_days: i64,
    /// Percentile at or above which a product is a best seller.
    pub best_seller_percentile: f64,
    /// Percentile at or below which a selling product is low-sales.
    pub low_sales_percentile: f64,
    /// Sales per day below which a selling product is stagnant.
    pub stagnant_velocity: f64,
    /// Alert list cap.
    pub max_alerts: usize,
    /// Size of the top products list.
    pub top_products: usize,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        ClassificationPolicy {
            no_movement_days: 7,
            best_seller_percentile: 90.0,
            low_sales_percentile: 20.0,
            stagnant_velocity: 0.5,
            max_alerts: 10,
            top_products: 5,
        }
    }
}

// =============================================================================
// Health Status & Badges
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum ProductHealth {
    NoMovement,
    BestSeller,
    LowSales,
    Stagnant,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Green,
    Orange,
    Red,
    Gray,
}

/// Display badge for a non-normal status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Badge {
    #[serde(rename = "type")]
    pub health: ProductHealth,
    pub label: String,
    pub color: BadgeColor,
}

impl ProductHealth {
    /// Badge shown next to the product. `None` for `normal`.
    pub fn badge(&self) -> Option<Badge> {
        let (label, color) = match self {
            ProductHealth::BestSeller => ("Mais Vendido", BadgeColor::Green),
            ProductHealth::LowSales => ("Pouca Saída", BadgeColor::Orange),
            ProductHealth::NoMovement => ("Sem Movimento 7 dias", BadgeColor::Red),
            ProductHealth::Stagnant => ("Risco de Encalhe", BadgeColor::Gray),
            ProductHealth::Normal => return None,
        };
        Some(Badge {
            health: *self,
            label: label.to_string(),
            color,
        })
    }
}

// =============================================================================
// Per-Product Computation
// =============================================================================

/// Raw sales figures for one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesStats {
    /// Σ qualifying exit quantities.
    pub total_sales: i64,
    /// Sales per day since the first qualifying sale (divisor ≥ 1 day).
    pub sales_velocity: f64,
    /// Whole days since the latest movement of any kind, or [`NEVER_MOVED`].
    pub days_since_last_movement: i64,
}

impl SalesStats {
    /// Neutral values used for a product whose history could not be read.
    pub const DEGRADED: SalesStats = SalesStats {
        total_sales: 0,
        sales_velocity: 0.0,
        days_since_last_movement: NEVER_MOVED,
    };
}

/// Whole days between two instants, rounded up.
pub fn days_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - earlier).num_milliseconds().abs();
    (millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

fn is_qualifying_sale(movement: &StockMovement) -> bool {
    movement.movement_type == MovementType::Exit && !is_manual_adjustment(&movement.reason)
}

/// Computes sales figures from one product's movements.
///
/// Returns `Err` with a reason when the history is inconsistent
/// (a non-positive quantity), which the caller reports as degraded.
pub fn sales_stats(movements: &[StockMovement], now: DateTime<Utc>) -> Result<SalesStats, String> {
    if let Some(bad) = movements.iter().find(|m| m.quantity <= 0) {
        return Err(format!(
            "movement {} has non-positive quantity {}",
            bad.id, bad.quantity
        ));
    }

    let days_since_last_movement = movements
        .iter()
        .map(|m| m.date)
        .max()
        .map(|last| days_between(last, now))
        .unwrap_or(NEVER_MOVED);

    let sales: Vec<&StockMovement> = movements.iter().filter(|m| is_qualifying_sale(m)).collect();
    let total_sales: i64 = sales.iter().map(|m| m.quantity).sum();

    let sales_velocity = match sales.iter().map(|m| m.date).min() {
        Some(first_sale) => {
            let days = days_between(first_sale, now).max(1);
            total_sales as f64 / days as f64
        }
        None => 0.0,
    };

    Ok(SalesStats {
        total_sales,
        sales_velocity,
        days_since_last_movement,
    })
}

/// Percentile of each entry against the whole list, in input order.
///
/// Rank is the zero-based position in a stable descending sort, so ties
/// keep their input order.
///
/// ```rust
/// use shopledger_core::analytics::percentiles;
///
/// let p = percentiles(&[100, 80, 60, 40, 20]);
/// assert_eq!(p, vec![100.0, 80.0, 60.0, 40.0, 20.0]);
/// ```
pub fn percentiles(total_sales: &[i64]) -> Vec<f64> {
    let n = total_sales.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| total_sales[b].cmp(&total_sales[a]));

    let mut result = vec![0.0; n];
    for (rank, &index) in order.iter().enumerate() {
        result[index] = (n - rank) as f64 / n as f64 * 100.0;
    }
    result
}

/// Classifies one product. First matching rule wins.
pub fn classify(stats: &SalesStats, percentile: f64, policy: &ClassificationPolicy) -> ProductHealth {
    if stats.days_since_last_movement >= policy.no_movement_days {
        ProductHealth::NoMovement
    } else if percentile >= policy.best_seller_percentile {
        ProductHealth::BestSeller
    } else if percentile <= policy.low_sales_percentile && stats.total_sales > 0 {
        ProductHealth::LowSales
    } else if stats.sales_velocity < policy.stagnant_velocity && stats.total_sales > 0 {
        ProductHealth::Stagnant
    } else {
        ProductHealth::Normal
    }
}

// =============================================================================
// Batch Result
// =============================================================================

/// Whether an item's figures are real or neutral fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Computed,
    Degraded { reason: String },
}

impl AnalysisOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, AnalysisOutcome::Degraded { .. })
    }
}

/// Analytics for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductAnalytics {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub stock: i64,
    pub price_cents: i64,
    pub total_sales: i64,
    pub sales_velocity: f64,
    pub days_since_last_movement: i64,
    pub percentile: f64,
    pub status: ProductHealth,
    pub badge: Option<Badge>,
    pub outcome: AnalysisOutcome,
}

/// One product and its movement history, or the reason it couldn't be loaded.
#[derive(Debug, Clone)]
pub struct ProductHistory {
    pub product: Product,
    pub movements: Result<Vec<StockMovement>, String>,
}

/// Analyzes a batch of products, preserving input order.
///
/// A product whose history failed to load or is inconsistent degrades to
/// zero sales, zero velocity, [`NEVER_MOVED`] and `normal`, and still
/// counts in the ranking with zero sales. The rest of the batch is
/// unaffected.
pub fn analyze(
    histories: &[ProductHistory],
    now: DateTime<Utc>,
    policy: &ClassificationPolicy,
) -> Vec<ProductAnalytics> {
    let computed: Vec<(SalesStats, AnalysisOutcome)> = histories
        .iter()
        .map(|h| {
            match h
                .movements
                .as_ref()
                .map_err(Clone::clone)
                .and_then(|m| sales_stats(m, now))
            {
                Ok(stats) => (stats, AnalysisOutcome::Computed),
                Err(reason) => (SalesStats::DEGRADED, AnalysisOutcome::Degraded { reason }),
            }
        })
        .collect();

    let sales: Vec<i64> = computed.iter().map(|(s, _)| s.total_sales).collect();
    let ranks = percentiles(&sales);

    histories
        .iter()
        .zip(computed)
        .zip(ranks)
        .map(|((history, (stats, outcome)), percentile)| {
            let status = if outcome.is_degraded() {
                ProductHealth::Normal
            } else {
                classify(&stats, percentile, policy)
            };
            let product = &history.product;
            ProductAnalytics {
                product_id: product.id.clone(),
                name: product.name.clone(),
                category: product.category.clone(),
                stock: product.stock,
                price_cents: product.price_cents,
                total_sales: stats.total_sales,
                sales_velocity: stats.sales_velocity,
                days_since_last_movement: stats.days_since_last_movement,
                percentile,
                status,
                badge: status.badge(),
                outcome,
            }
        })
        .collect()
}

// =============================================================================
// Summary
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub total_sales: i64,
    /// total sales × current price.
    pub revenue: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Alert {
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub product_id: String,
    pub product_name: String,
    pub message: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnalyticsMetrics {
    pub total_products: usize,
    /// Products with stock > 0.
    pub active_products: usize,
    pub stagnant_products: usize,
    pub no_movement_products: usize,
    pub degraded_products: usize,
    pub average_sales_velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnalyticsSummary {
    pub top_products: Vec<TopProduct>,
    pub alerts: Vec<Alert>,
    pub metrics: AnalyticsMetrics,
}

fn alert_for(item: &ProductAnalytics) -> Option<(AlertLevel, String, &'static str)> {
    if item.days_since_last_movement == NEVER_MOVED && !item.outcome.is_degraded() {
        return Some((
            AlertLevel::Info,
            "Produto novo sem registros de saída".to_string(),
            "Aguardando primeira venda",
        ));
    }
    match item.status {
        ProductHealth::NoMovement => Some((
            AlertLevel::Danger,
            format!("Sem movimento há {} dias", item.days_since_last_movement),
            "Considere fazer promoção ou desconto",
        )),
        ProductHealth::Stagnant => Some((
            AlertLevel::Warning,
            "Baixa rotatividade detectada".to_string(),
            "Produto em risco de encalhe",
        )),
        ProductHealth::LowSales if item.stock > 10 => Some((
            AlertLevel::Warning,
            "Pouca saída com estoque alto".to_string(),
            "Avaliar estratégia de vendas",
        )),
        ProductHealth::BestSeller if item.stock < 5 => Some((
            AlertLevel::Info,
            "Produto popular com estoque baixo".to_string(),
            "Considere reabastecer urgentemente",
        )),
        _ => None,
    }
}

/// Builds the dashboard summary.
///
/// Alerts follow the analytics list order, not severity, and are capped at
/// `policy.max_alerts`.
pub fn summarize(analytics: &[ProductAnalytics], policy: &ClassificationPolicy) -> AnalyticsSummary {
    let mut by_sales: Vec<&ProductAnalytics> = analytics.iter().collect();
    by_sales.sort_by(|a, b| b.total_sales.cmp(&a.total_sales));

    let top_products = by_sales
        .into_iter()
        .take(policy.top_products)
        .map(|p| TopProduct {
            product_id: p.product_id.clone(),
            name: p.name.clone(),
            total_sales: p.total_sales,
            revenue: Money::from_cents(p.price_cents).multiply_quantity(p.total_sales),
        })
        .collect();

    let alerts = analytics
        .iter()
        .filter_map(|item| {
            alert_for(item).map(|(level, message, action)| Alert {
                level,
                product_id: item.product_id.clone(),
                product_name: item.name.clone(),
                message,
                action: action.to_string(),
            })
        })
        .take(policy.max_alerts)
        .collect();

    let count = |health: ProductHealth| analytics.iter().filter(|p| p.status == health).count();
    let average_sales_velocity = if analytics.is_empty() {
        0.0
    } else {
        analytics.iter().map(|p| p.sales_velocity).sum::<f64>() / analytics.len() as f64
    };

    AnalyticsSummary {
        top_products,
        alerts,
        metrics: AnalyticsMetrics {
            total_products: analytics.len(),
            active_products: analytics.iter().filter(|p| p.stock > 0).count(),
            stagnant_products: count(ProductHealth::Stagnant),
            no_movement_products: count(ProductHealth::NoMovement),
            degraded_products: analytics.iter().filter(|p| p.outcome.is_degraded()).count(),
            average_sales_velocity,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductStatus;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Produto {id}"),
            category: "Peças".into(),
            price_cents: 1_000,
            cost_cents: 600,
            stock,
            min_stock: 1,
            status: ProductStatus::for_stock(stock),
            is_deleted: false,
            created_at: now() - Duration::days(30),
            updated_at: now() - Duration::days(30),
        }
    }

    fn movement(kind: MovementType, qty: i64, reason: &str, days_ago: i64) -> StockMovement {
        StockMovement {
            id: uuid::Uuid::new_v4().to_string(),
            product_id: "p".into(),
            user_id: None,
            movement_type: kind,
            quantity: qty,
            reason: reason.into(),
            date: now() - Duration::days(days_ago),
        }
    }

    fn history(id: &str, stock: i64, movements: Vec<StockMovement>) -> ProductHistory {
        ProductHistory {
            product: product(id, stock),
            movements: Ok(movements),
        }
    }

    #[test]
    fn test_days_between_rounds_up() {
        assert_eq!(days_between(now(), now()), 0);
        assert_eq!(days_between(now() - Duration::hours(1), now()), 1);
        assert_eq!(days_between(now() - Duration::days(7), now()), 7);
    }

    #[test]
    fn test_sales_exclude_manual_adjustments() {
        let movements = vec![
            movement(MovementType::Exit, 4, "Venda/Saída", 2),
            movement(MovementType::Exit, 9, "Ajuste Manual (Saída)", 1),
            movement(MovementType::Exit, 1, "Correction", 1),
            movement(MovementType::Entry, 20, "Entrada/Ajuste", 3),
        ];
        let stats = sales_stats(&movements, now()).unwrap();
        assert_eq!(stats.total_sales, 4);
        assert_eq!(stats.days_since_last_movement, 1);
        // first sale 2 days ago → 4 / 2
        assert!((stats.sales_velocity - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_divisor_is_at_least_one_day() {
        let movements = vec![movement(MovementType::Exit, 3, "Venda/Saída", 0)];
        let stats = sales_stats(&movements, now()).unwrap();
        assert!((stats.sales_velocity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_moved_sentinel() {
        let stats = sales_stats(&[], now()).unwrap();
        assert_eq!(stats.days_since_last_movement, NEVER_MOVED);
        assert_eq!(stats.total_sales, 0);
        assert_eq!(stats.sales_velocity, 0.0);
    }

    #[test]
    fn test_percentiles_for_five_products() {
        let p = percentiles(&[100, 80, 60, 40, 20]);
        assert_eq!(p[0], 100.0);
        assert_eq!(p[4], 20.0);
    }

    #[test]
    fn test_percentile_ties_keep_input_order() {
        let p = percentiles(&[5, 5, 5, 5]);
        assert_eq!(p, vec![100.0, 75.0, 50.0, 25.0]);
    }

    #[test]
    fn test_classification_priority() {
        let policy = ClassificationPolicy::default();
        let stale = SalesStats {
            total_sales: 50,
            sales_velocity: 10.0,
            days_since_last_movement: 7,
        };
        // recency beats percentile
        assert_eq!(classify(&stale, 100.0, &policy), ProductHealth::NoMovement);

        let selling = SalesStats {
            total_sales: 3,
            sales_velocity: 0.1,
            days_since_last_movement: 1,
        };
        assert_eq!(classify(&selling, 95.0, &policy), ProductHealth::BestSeller);
        assert_eq!(classify(&selling, 20.0, &policy), ProductHealth::LowSales);
        assert_eq!(classify(&selling, 50.0, &policy), ProductHealth::Stagnant);

        let brisk = SalesStats {
            sales_velocity: 2.0,
            ..selling
        };
        assert_eq!(classify(&brisk, 50.0, &policy), ProductHealth::Normal);

        let never_sold = SalesStats {
            total_sales: 0,
            sales_velocity: 0.0,
            days_since_last_movement: 1,
        };
        assert_eq!(classify(&never_sold, 20.0, &policy), ProductHealth::Normal);
    }

    #[test]
    fn test_analyze_five_products() {
        let histories: Vec<ProductHistory> = [100, 80, 60, 40, 20]
            .iter()
            .enumerate()
            .map(|(i, &qty)| {
                history(
                    &format!("p{i}"),
                    10,
                    vec![movement(MovementType::Exit, qty, "Venda/Saída", 1)],
                )
            })
            .collect();

        let result = analyze(&histories, now(), &ClassificationPolicy::default());
        assert_eq!(result.len(), 5);
        assert_eq!(result[0].percentile, 100.0);
        assert_eq!(result[0].status, ProductHealth::BestSeller);
        assert_eq!(result[0].badge.as_ref().unwrap().label, "Mais Vendido");
        assert_eq!(result[4].percentile, 20.0);
        assert_eq!(result[4].status, ProductHealth::LowSales);
        assert!(result.iter().all(|r| r.outcome == AnalysisOutcome::Computed));
    }

    #[test]
    fn test_degraded_item_does_not_abort_batch() {
        let histories = vec![
            history("ok", 5, vec![movement(MovementType::Exit, 2, "Venda/Saída", 1)]),
            ProductHistory {
                product: product("broken", 5),
                movements: Err("database is locked".into()),
            },
            history("corrupt", 5, vec![movement(MovementType::Exit, 0, "Venda/Saída", 1)]),
        ];

        let result = analyze(&histories, now(), &ClassificationPolicy::default());
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].total_sales, 2);
        assert_eq!(result[0].outcome, AnalysisOutcome::Computed);

        for degraded in &result[1..] {
            assert!(degraded.outcome.is_degraded());
            assert_eq!(degraded.total_sales, 0);
            assert_eq!(degraded.sales_velocity, 0.0);
            assert_eq!(degraded.days_since_last_movement, NEVER_MOVED);
            assert_eq!(degraded.status, ProductHealth::Normal);
            assert!(degraded.badge.is_none());
        }
    }

    #[test]
    fn test_summary_top_products_and_alerts() {
        let histories = vec![
            history("new", 3, vec![]),
            history("stale", 20, vec![movement(MovementType::Exit, 1, "Venda/Saída", 10)]),
            history("hot", 2, vec![movement(MovementType::Exit, 50, "Venda/Saída", 1)]),
        ];
        let policy = ClassificationPolicy::default();
        let analytics = analyze(&histories, now(), &policy);
        let summary = summarize(&analytics, &policy);

        assert_eq!(summary.top_products[0].product_id, "hot");
        assert_eq!(summary.top_products[0].revenue, Money::from_cents(50_000));

        let messages: Vec<&str> = summary.alerts.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Produto novo sem registros de saída",
                "Sem movimento há 10 dias",
                "Produto popular com estoque baixo",
            ]
        );
        assert_eq!(summary.alerts[1].level, AlertLevel::Danger);

        assert_eq!(summary.metrics.total_products, 3);
        assert_eq!(summary.metrics.active_products, 3);
        assert_eq!(summary.metrics.no_movement_products, 1);
    }

    #[test]
    fn test_alerts_are_capped() {
        let histories: Vec<ProductHistory> =
            (0..15).map(|i| history(&format!("n{i}"), 1, vec![])).collect();
        let policy = ClassificationPolicy::default();
        let summary = summarize(&analyze(&histories, now(), &policy), &policy);
        assert_eq!(summary.alerts.len(), 10);
        assert_eq!(summary.alerts[0].product_id, "n0");
        assert_eq!(summary.top_products.len(), 5);
    }

    #[test]
    fn test_degraded_items_get_no_new_product_alert() {
        let histories = vec![ProductHistory {
            product: product("broken", 1),
            movements: Err("timeout".into()),
        }];
        let policy = ClassificationPolicy::default();
        let summary = summarize(&analyze(&histories, now(), &policy), &policy);
        assert!(summary.alerts.is_empty());
        assert_eq!(summary.metrics.degraded_products, 1);
    }
}
