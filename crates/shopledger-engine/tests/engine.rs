//! End-to-end engine behaviour against an in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use shopledger_core::analytics::ProductHealth;
use shopledger_core::{
    Clock, ManualClock, MovementType, NewPettyCash, NewProduct, NewServiceOrder, NewTransaction,
    PartRequest, PettyCashType, Product, ProductPatch, ProductStatus, ServiceOrderPatch,
    ServiceStatus, StockAdjustment, TransactionStatus, TransactionType,
};
use shopledger_engine::{
    ChangeEvent, EngineError, Entity, ErrorKind, LedgerConfig, ShopLedger, StaticActorResolver,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

async fn open(config: LedgerConfig) -> (ShopLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start()));
    let ledger = ShopLedger::builder(config)
        .clock(clock.clone())
        .actor_resolver(Arc::new(StaticActorResolver::default()))
        .build()
        .await
        .unwrap();
    (ledger, clock)
}

async fn ledger() -> (ShopLedger, Arc<ManualClock>) {
    open(LedgerConfig::in_memory()).await
}

async fn product(ledger: &ShopLedger, name: &str, stock: i64, price: i64, cost: i64) -> Product {
    ledger
        .stock()
        .create_product(
            None,
            NewProduct {
                name: name.into(),
                category: "Peças".into(),
                price_cents: price,
                cost_cents: cost,
                stock,
                min_stock: 1,
            },
        )
        .await
        .unwrap()
}

fn adjustment(product: &Product, direction: MovementType, quantity: i64) -> StockAdjustment {
    StockAdjustment {
        product_id: product.id.clone(),
        direction,
        quantity,
        reason: None,
        record_financial: false,
    }
}

fn kind<T: std::fmt::Debug>(result: Result<T, EngineError>) -> ErrorKind {
    result.unwrap_err().kind()
}

// =============================================================================
// Stock adjustments
// =============================================================================

#[tokio::test]
async fn test_exit_records_sale_and_keeps_stock_consistent() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Ecrã A10", 10, 1_500, 1_000).await;

    let result = ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Exit, 3))
        .await
        .unwrap();

    assert_eq!(result.product.stock, 7);
    assert_eq!(result.product.status, ProductStatus::Active);
    assert_eq!(result.movement.movement_type, MovementType::Exit);
    assert_eq!(result.movement.reason, "Venda/Saída");

    let sale = result.transaction.unwrap();
    assert_eq!(sale.transaction_type, TransactionType::Income);
    assert_eq!(sale.amount_cents, 4_500);
    assert_eq!(sale.cost_amount_cents, Some(3_000));
    assert_eq!(sale.category, "Venda de Produto");
    assert_eq!(sale.status, TransactionStatus::Paid);
    assert_eq!(sale.date, start());
    assert_eq!(sale.due_date, start());

    let net = ledger.database().movements().net_quantity(&p.id).await.unwrap();
    assert_eq!(net, 7);
}

#[tokio::test]
async fn test_exit_beyond_stock_changes_nothing() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Bateria", 2, 500, 300).await;
    let transactions_before = ledger.finance().list_transactions(None).await.unwrap().len();

    let err = ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Exit, 5))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    assert_eq!(
        err.to_string(),
        "Insufficient stock for Bateria: available 2, requested 5"
    );

    let after = ledger.stock().get_product(&p.id).await.unwrap();
    assert_eq!(after.stock, 2);
    assert_eq!(ledger.stock().list_movements(Some(&p.id)).await.unwrap().len(), 1);
    assert_eq!(
        ledger.finance().list_transactions(None).await.unwrap().len(),
        transactions_before
    );
}

#[tokio::test]
async fn test_exit_to_zero_marks_out_of_stock() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Conector", 4, 100, 50).await;

    let result = ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Exit, 4))
        .await
        .unwrap();
    assert_eq!(result.product.stock, 0);
    assert_eq!(result.product.status, ProductStatus::OutOfStock);

    let result = ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Entry, 1))
        .await
        .unwrap();
    assert_eq!(result.product.status, ProductStatus::Active);
}

#[tokio::test]
async fn test_adjustment_preconditions() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Capa", 5, 100, 50).await;

    let zero = ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Entry, 0))
        .await;
    assert_eq!(kind(zero), ErrorKind::Validation);

    let mut missing = adjustment(&p, MovementType::Exit, 1);
    missing.product_id = "does-not-exist".into();
    assert_eq!(
        kind(ledger.stock().adjust_stock(None, missing).await),
        ErrorKind::NotFound
    );

    let mut entry = adjustment(&p, MovementType::Entry, 1);
    entry.product_id = "does-not-exist".into();
    assert_eq!(
        kind(ledger.stock().adjust_stock(None, entry).await),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_entry_records_expense_only_when_requested() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Película", 0, 150, 30).await;

    let plain = ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Entry, 10))
        .await
        .unwrap();
    assert!(plain.transaction.is_none());
    assert_eq!(plain.movement.reason, "Entrada/Ajuste");

    let mut purchase = adjustment(&p, MovementType::Entry, 5);
    purchase.record_financial = true;
    purchase.reason = Some("Fornecedor Maputo".into());
    let result = ledger.stock().adjust_stock(None, purchase).await.unwrap();

    let expense = result.transaction.unwrap();
    assert_eq!(expense.transaction_type, TransactionType::Expense);
    assert_eq!(expense.amount_cents, 150);
    assert_eq!(expense.category, "Compra de Estoque");
    assert_eq!(expense.description, "Fornecedor Maputo");
    assert_eq!(result.movement.reason, "Fornecedor Maputo");
    assert_eq!(result.product.stock, 15);
}

#[tokio::test]
async fn test_balance_guard_refuses_uncovered_purchases() {
    let mut config = LedgerConfig::in_memory();
    config.finance.enforce_cash_balance = true;
    let (ledger, _) = open(config).await;

    let refused = ledger
        .stock()
        .create_product(
            None,
            NewProduct {
                name: "Ecrã iPhone".into(),
                category: "Ecrãs".into(),
                price_cents: 4_000,
                cost_cents: 3_000,
                stock: 2,
                min_stock: 0,
            },
        )
        .await;
    assert_eq!(kind(refused), ErrorKind::Conflict);
    assert!(ledger.stock().list_products().await.unwrap().is_empty());

    // free stock needs no balance
    let p = product(&ledger, "Brinde", 3, 0, 0).await;
    let mut purchase = adjustment(&p, MovementType::Entry, 1);
    purchase.record_financial = true;
    let result = ledger.stock().adjust_stock(None, purchase).await.unwrap();
    assert_eq!(result.transaction.map(|t| t.amount_cents), Some(0));

    ledger
        .finance()
        .record_transaction(
            None,
            NewTransaction {
                transaction_type: TransactionType::Income,
                amount_cents: 10_000,
                cost_amount_cents: None,
                category: "Capital".into(),
                status: TransactionStatus::Paid,
                description: "Capital inicial".into(),
                client_name: None,
                payment_method: None,
                date: None,
                due_date: None,
            },
        )
        .await
        .unwrap();

    let p = product(&ledger, "Ecrã iPhone", 2, 4_000, 3_000).await;
    assert_eq!(p.stock, 2);
    assert_eq!(ledger.finance().current_balance().await.unwrap().cents(), 4_000);
}

// =============================================================================
// Product lifecycle
// =============================================================================

#[tokio::test]
async fn test_create_product_records_initial_investment() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Capa de Silicone", 5, 250, 100).await;

    assert_eq!(p.stock, 5);
    assert_eq!(p.status, ProductStatus::Active);

    let movements = ledger.stock().list_movements(Some(&p.id)).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Entry);
    assert_eq!(movements[0].quantity, 5);
    assert_eq!(movements[0].reason, "Entrada Inicial (Cadastro)");

    let transactions = ledger.finance().list_transactions(None).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].transaction_type, TransactionType::Expense);
    assert_eq!(transactions[0].amount_cents, 500);
    assert_eq!(transactions[0].category, "Compra de Estoque");

    let empty = product(&ledger, "Sem estoque", 0, 250, 100).await;
    assert_eq!(empty.status, ProductStatus::OutOfStock);
    assert!(ledger.stock().list_movements(Some(&empty.id)).await.unwrap().is_empty());
    assert_eq!(ledger.finance().list_transactions(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_product_validates_input() {
    let (ledger, _) = ledger().await;
    let result = ledger
        .stock()
        .create_product(
            None,
            NewProduct {
                name: "   ".into(),
                stock: 1,
                ..NewProduct::default()
            },
        )
        .await;
    assert_eq!(kind(result), ErrorKind::Validation);

    let result = ledger
        .stock()
        .create_product(
            None,
            NewProduct {
                name: "Capa".into(),
                stock: -1,
                ..NewProduct::default()
            },
        )
        .await;
    assert_eq!(kind(result), ErrorKind::Validation);
}

#[tokio::test]
async fn test_manual_edit_records_movement_without_transaction() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Carregador", 10, 800, 450).await;
    let transactions_before = ledger.finance().list_transactions(None).await.unwrap().len();

    let update = ledger
        .stock()
        .update_product(
            None,
            &p.id,
            ProductPatch {
                stock: Some(15),
                price_cents: Some(900),
                ..ProductPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(update.old_stock, 10);
    assert_eq!(update.product.stock, 15);
    assert_eq!(update.product.price_cents, 900);
    assert_eq!(update.product.name, "Carregador");

    let movements = ledger.stock().list_movements(Some(&p.id)).await.unwrap();
    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].movement_type, MovementType::Entry);
    assert_eq!(movements[0].quantity, 5);
    assert_eq!(movements[0].reason, "Ajuste Manual (Entrada)");

    assert_eq!(
        ledger.finance().list_transactions(None).await.unwrap().len(),
        transactions_before
    );

    let negative = ledger
        .stock()
        .update_product(
            None,
            &p.id,
            ProductPatch {
                stock: Some(-1),
                ..ProductPatch::default()
            },
        )
        .await;
    assert_eq!(kind(negative), ErrorKind::Validation);

    // an edit that leaves stock alone writes no movement
    ledger
        .stock()
        .update_product(
            None,
            &p.id,
            ProductPatch {
                name: Some("Carregador 25W".into()),
                ..ProductPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ledger.stock().list_movements(Some(&p.id)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_products_is_soft() {
    let (ledger, _) = ledger().await;
    let a = product(&ledger, "A", 1, 100, 0).await;
    let b = product(&ledger, "B", 1, 100, 0).await;

    assert_eq!(kind(ledger.stock().delete_products(None, &[]).await), ErrorKind::Validation);

    let deleted = ledger
        .stock()
        .delete_products(None, &[a.id.clone(), "unknown".to_string()])
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let remaining = ledger.stock().list_products().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, b.id);

    assert_eq!(kind(ledger.stock().get_product(&a.id).await), ErrorKind::NotFound);
    assert_eq!(ledger.stock().list_movements(Some(&a.id)).await.unwrap().len(), 1);

    let exit = ledger
        .stock()
        .adjust_stock(None, adjustment(&a, MovementType::Exit, 1))
        .await;
    assert_eq!(kind(exit), ErrorKind::NotFound);
}

// =============================================================================
// Service orders
// =============================================================================

fn repair(client: &str, device: &str, price: i64) -> NewServiceOrder {
    NewServiceOrder {
        client_name: client.into(),
        device_model: device.into(),
        price_cents: price,
        ..NewServiceOrder::default()
    }
}

#[tokio::test]
async fn test_service_order_with_short_part_consumes_nothing() {
    let (ledger, _) = ledger().await;
    let screen = product(&ledger, "Ecrã", 5, 1_000, 600).await;
    let battery = product(&ledger, "Bateria", 1, 500, 300).await;

    let err = ledger
        .services()
        .create_service_order(
            None,
            repair("Ana", "A10", 2_000),
            vec![
                PartRequest {
                    product_id: screen.id.clone(),
                    quantity: 2,
                },
                PartRequest {
                    product_id: battery.id.clone(),
                    quantity: 3,
                },
            ],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    assert!(err.to_string().contains("Bateria"));

    assert_eq!(ledger.stock().get_product(&screen.id).await.unwrap().stock, 5);
    assert_eq!(ledger.stock().get_product(&battery.id).await.unwrap().stock, 1);
    assert_eq!(ledger.stock().list_movements(Some(&screen.id)).await.unwrap().len(), 1);
    assert!(ledger.services().list_service_orders().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_service_order_part_errors() {
    let (ledger, _) = ledger().await;
    let screen = product(&ledger, "Ecrã", 5, 1_000, 600).await;

    let zero = ledger
        .services()
        .create_service_order(
            None,
            repair("Ana", "A10", 2_000),
            vec![PartRequest {
                product_id: screen.id.clone(),
                quantity: 0,
            }],
        )
        .await;
    assert_eq!(kind(zero), ErrorKind::Validation);

    let unknown = ledger
        .services()
        .create_service_order(
            None,
            repair("Ana", "A10", 2_000),
            vec![PartRequest {
                product_id: "unknown".into(),
                quantity: 1,
            }],
        )
        .await;
    assert_eq!(kind(unknown), ErrorKind::NotFound);

    let no_client = ledger
        .services()
        .create_service_order(None, repair("", "A10", 2_000), vec![])
        .await;
    assert_eq!(kind(no_client), ErrorKind::Validation);
}

#[tokio::test]
async fn test_service_lifecycle_settles_income_on_delivery() {
    let (ledger, clock) = ledger().await;
    let screen = product(&ledger, "Ecrã", 5, 1_000, 600).await;
    let connector = product(&ledger, "Conector", 10, 200, 80).await;

    let created = ledger
        .services()
        .create_service_order(
            None,
            repair("Ana", "Samsung A10", 2_500),
            vec![
                PartRequest {
                    product_id: screen.id.clone(),
                    quantity: 1,
                },
                PartRequest {
                    product_id: connector.id.clone(),
                    quantity: 2,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(created.order.status, ServiceStatus::Pending);
    assert_eq!(created.order.cost_cents, 600 + 2 * 80);
    assert!(created.order.delivered_at.is_none());
    assert_eq!(created.parts.len(), 2);
    assert_eq!(created.parts[0].unit_cost_cents, 600);

    assert_eq!(ledger.stock().get_product(&screen.id).await.unwrap().stock, 4);
    assert_eq!(ledger.stock().get_product(&connector.id).await.unwrap().stock, 8);
    let used = ledger.stock().list_movements(Some(&connector.id)).await.unwrap();
    assert_eq!(used[0].reason, "Uso em Serviço: Samsung A10 (Ana)");

    let income = ledger
        .database()
        .transactions()
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.service_order_id.as_deref() == Some(created.order.id.as_str()))
        .unwrap();
    assert_eq!(income.status, TransactionStatus::Pending);
    assert_eq!(income.amount_cents, 2_500);
    assert_eq!(income.cost_amount_cents, Some(760));
    assert_eq!(income.description, "Serviço: Samsung A10 - Ana");
    assert_eq!(income.client_name.as_deref(), Some("Ana"));

    // repricing and renaming mirror onto the pending income
    ledger
        .services()
        .update_service_order(
            None,
            &created.order.id,
            ServiceOrderPatch {
                client_name: Some("Ana Maria".into()),
                price_cents: Some(3_000),
                status: Some(ServiceStatus::InProgress),
                ..ServiceOrderPatch::default()
            },
        )
        .await
        .unwrap();

    let synced = ledger.database().transactions().get_by_id(&income.id).await.unwrap().unwrap();
    assert_eq!(synced.amount_cents, 3_000);
    assert_eq!(synced.description, "Serviço: Samsung A10 - Ana Maria");
    assert_eq!(synced.client_name.as_deref(), Some("Ana Maria"));
    assert_eq!(synced.status, TransactionStatus::Pending);

    clock.advance(Duration::days(2));
    let delivered = ledger
        .services()
        .update_service_order(
            None,
            &created.order.id,
            ServiceOrderPatch {
                status: Some(ServiceStatus::Delivered),
                ..ServiceOrderPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(delivered.status, ServiceStatus::Delivered);
    assert_eq!(delivered.delivered_at, Some(start() + Duration::days(2)));

    let paid = ledger.database().transactions().get_by_id(&income.id).await.unwrap().unwrap();
    assert_eq!(paid.status, TransactionStatus::Paid);
    assert_eq!(paid.date, start() + Duration::days(2));

    let reopened = ledger
        .services()
        .update_service_order(
            None,
            &created.order.id,
            ServiceOrderPatch {
                status: Some(ServiceStatus::Pending),
                ..ServiceOrderPatch::default()
            },
        )
        .await;
    assert_eq!(kind(reopened), ErrorKind::Conflict);

    // paid income no longer follows the order
    ledger
        .services()
        .update_service_order(
            None,
            &created.order.id,
            ServiceOrderPatch {
                price_cents: Some(9_999),
                ..ServiceOrderPatch::default()
            },
        )
        .await
        .unwrap();
    let settled = ledger.database().transactions().get_by_id(&income.id).await.unwrap().unwrap();
    assert_eq!(settled.amount_cents, 3_000);
}

#[tokio::test]
async fn test_service_created_delivered_is_paid_and_free_service_bills_nothing() {
    let (ledger, _) = ledger().await;

    let delivered = ledger
        .services()
        .create_service_order(
            None,
            NewServiceOrder {
                status: ServiceStatus::Delivered,
                ..repair("Carlos", "iPhone X", 1_200)
            },
            vec![],
        )
        .await
        .unwrap();
    assert_eq!(delivered.order.delivered_at, Some(start()));

    let free = ledger
        .services()
        .create_service_order(None, repair("Rita", "Nokia", 0), vec![])
        .await
        .unwrap();

    let transactions = ledger.finance().list_transactions(None).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].status, TransactionStatus::Paid);
    assert_eq!(
        transactions[0].service_order_id.as_deref(),
        Some(delivered.order.id.as_str())
    );
    assert_ne!(transactions[0].service_order_id.as_deref(), Some(free.order.id.as_str()));
}

#[tokio::test]
async fn test_delete_service_keeps_income_and_consumed_stock() {
    let (ledger, _) = ledger().await;
    let screen = product(&ledger, "Ecrã", 3, 1_000, 600).await;

    let order = ledger
        .services()
        .create_service_order(
            None,
            repair("Ana", "A10", 2_000),
            vec![PartRequest {
                product_id: screen.id.clone(),
                quantity: 1,
            }],
        )
        .await
        .unwrap();

    ledger
        .services()
        .delete_service_order(None, &order.order.id)
        .await
        .unwrap();

    assert_eq!(
        kind(ledger.services().get_service_order(&order.order.id).await),
        ErrorKind::NotFound
    );
    assert_eq!(
        kind(ledger.services().delete_service_order(None, &order.order.id).await),
        ErrorKind::NotFound
    );
    assert_eq!(ledger.stock().get_product(&screen.id).await.unwrap().stock, 2);

    let income = ledger
        .finance()
        .list_transactions(None)
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.category == "Serviço de Reparo")
        .unwrap();
    assert!(income.service_order_id.is_none());
}

// =============================================================================
// Analytics
// =============================================================================

#[tokio::test]
async fn test_percentiles_and_best_seller() {
    let (ledger, _) = ledger().await;
    let mut products = Vec::new();
    for (i, sales) in [100, 80, 60, 40, 20].into_iter().enumerate() {
        let p = product(&ledger, &format!("Produto {i}"), 100, 100, 0).await;
        ledger
            .stock()
            .adjust_stock(None, adjustment(&p, MovementType::Exit, sales))
            .await
            .unwrap();
        products.push(p);
    }

    let batch = ledger.analytics().analyze_products().await.unwrap();
    assert_eq!(batch.len(), 5);
    assert_eq!(batch[0].product_id, products[0].id);
    assert_eq!(batch[0].total_sales, 100);
    assert_eq!(batch[0].percentile, 100.0);
    assert_eq!(batch[0].status, ProductHealth::BestSeller);
    assert_eq!(batch[4].percentile, 20.0);
    assert!(batch.iter().all(|a| !a.outcome.is_degraded()));

    let summary = ledger.analytics().get_analytics_summary().await.unwrap();
    assert_eq!(summary.top_products[0].product_id, products[0].id);
    assert_eq!(summary.top_products[0].revenue.cents(), 100 * 100);
    assert_eq!(summary.metrics.total_products, 5);
}

#[tokio::test]
async fn test_manual_corrections_are_not_sales() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Capa", 10, 100, 0).await;

    ledger
        .stock()
        .update_product(
            None,
            &p.id,
            ProductPatch {
                stock: Some(4),
                ..ProductPatch::default()
            },
        )
        .await
        .unwrap();

    let batch = ledger.analytics().analyze_products().await.unwrap();
    assert_eq!(batch[0].total_sales, 0);
    assert_eq!(batch[0].sales_velocity, 0.0);
}

#[tokio::test]
async fn test_analytics_cache_shares_and_invalidates() {
    let (ledger, clock) = ledger().await;
    let p = product(&ledger, "Capa", 10, 100, 0).await;

    let first = ledger.analytics().analyze_products().await.unwrap();
    clock.advance(Duration::minutes(4));
    let second = ledger.analytics().analyze_products().await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Exit, 3))
        .await
        .unwrap();

    let third = ledger.analytics().analyze_products().await.unwrap();
    assert!(!Arc::ptr_eq(&second, &third));
    assert_eq!(third[0].total_sales, 3);
    assert_eq!(third[0].stock, 7);

    clock.advance(Duration::minutes(5));
    let fourth = ledger.analytics().analyze_products().await.unwrap();
    assert!(!Arc::ptr_eq(&third, &fourth));

    ledger.analytics().invalidate();
    let fifth = ledger.analytics().analyze_products().await.unwrap();
    assert!(!Arc::ptr_eq(&fourth, &fifth));
}

#[tokio::test]
async fn test_stale_products_get_no_movement_alert() {
    let (ledger, clock) = ledger().await;
    let p = product(&ledger, "Capa Antiga", 20, 100, 0).await;
    ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Exit, 1))
        .await
        .unwrap();

    clock.advance(Duration::days(10));
    ledger.analytics().invalidate();

    let summary = ledger.analytics().get_analytics_summary().await.unwrap();
    assert_eq!(summary.metrics.no_movement_products, 1);
    assert_eq!(summary.alerts.len(), 1);
    assert_eq!(summary.alerts[0].message, "Sem movimento há 10 dias");
}

// =============================================================================
// Finance, petty cash, audit & notifications
// =============================================================================

#[tokio::test]
async fn test_financial_summary() {
    let (ledger, clock) = ledger().await;

    ledger
        .finance()
        .record_transaction(
            None,
            NewTransaction {
                transaction_type: TransactionType::Income,
                amount_cents: 10_000,
                cost_amount_cents: None,
                category: "Capital".into(),
                status: TransactionStatus::Paid,
                description: "Capital inicial".into(),
                client_name: None,
                payment_method: None,
                date: Some(start() - Duration::days(3)),
                due_date: None,
            },
        )
        .await
        .unwrap();

    let p = product(&ledger, "Capa", 5, 300, 100).await;
    ledger
        .stock()
        .adjust_stock(None, adjustment(&p, MovementType::Exit, 2))
        .await
        .unwrap();

    let summary = ledger.finance().financial_summary(clock.now()).await.unwrap();
    assert_eq!(summary.total_income.cents(), 10_600);
    assert_eq!(summary.product_revenue.cents(), 600);
    assert_eq!(summary.other_income.cents(), 10_000);
    assert_eq!(summary.stock_investment.cents(), 500);
    assert_eq!(summary.cogs.cents(), 200);
    assert_eq!(summary.balance.cents(), 10_100);
    assert_eq!(summary.net_profit.cents(), 10_400);
    assert_eq!(summary.today_income.cents(), 600);
    assert_eq!(summary.inventory_value.cents(), 900);
    assert_eq!(summary.active_products, 1);

    assert_eq!(ledger.finance().current_balance().await.unwrap().cents(), 10_100);
}

#[tokio::test]
async fn test_petty_cash_is_separate_from_ledger() {
    let (ledger, _) = ledger().await;
    let finance = ledger.finance();

    finance
        .record_petty_cash(
            None,
            NewPettyCash {
                entry_type: PettyCashType::Deposit,
                amount_cents: 2_000,
                description: "Fundo".into(),
            },
        )
        .await
        .unwrap();
    finance
        .record_petty_cash(
            None,
            NewPettyCash {
                entry_type: PettyCashType::Expense,
                amount_cents: 350,
                description: "Água".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(finance.petty_cash_balance().await.unwrap().cents(), 1_650);
    assert_eq!(finance.list_petty_cash().await.unwrap().len(), 2);
    assert_eq!(finance.current_balance().await.unwrap().cents(), 0);

    let invalid = finance
        .record_petty_cash(
            None,
            NewPettyCash {
                entry_type: PettyCashType::Expense,
                amount_cents: 0,
                description: "Nada".into(),
            },
        )
        .await;
    assert_eq!(kind(invalid), ErrorKind::Validation);
}

#[tokio::test]
async fn test_adjustment_is_audited_and_broadcast() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Ecrã A10", 10, 1_500, 1_000).await;

    let mut events = ledger.subscribe();
    let mut exit = adjustment(&p, MovementType::Exit, 2);
    exit.reason = Some("Venda balcão".into());
    ledger.stock().adjust_stock(None, exit).await.unwrap();

    match events.recv().await.unwrap() {
        ChangeEvent::NewLog(log) => {
            assert_eq!(log.action, "STOCK_ADJUST");
            assert_eq!(log.category, "INVENTORY");
            assert_eq!(log.details, "Ajuste de estoque (-2) em Ecrã A10 - Motivo: Venda balcão");
            assert!(log.user_id.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(
        events.recv().await.unwrap(),
        ChangeEvent::data_updated(Entity::Products, "adjust-stock")
    );
    assert_eq!(
        events.recv().await.unwrap(),
        ChangeEvent::data_updated(Entity::Transactions, "create")
    );

    let logs = ledger.database().logs().recent(10).await.unwrap();
    assert!(logs.iter().any(|l| l.action == "PRODUCT_CREATE"
        && l.details == "Cadastrou: Ecrã A10 | Inicial: 10 un | Valor: MT 150.00"));
}

#[tokio::test]
async fn test_actor_is_recorded_on_movements() {
    let admin = "7f1c1e2a-4a59-4c7e-9d43-5b0f6b1f2a10".to_string();
    let clock = Arc::new(ManualClock::new(start()));
    let ledger = ShopLedger::builder(LedgerConfig::in_memory())
        .clock(clock)
        .actor_resolver(Arc::new(StaticActorResolver::new(Some(admin.clone()))))
        .build()
        .await
        .unwrap();

    let p = product(&ledger, "Capa", 3, 100, 0).await;
    let staff = "0b8e0c34-0d7a-4e39-8d54-2f0a0c6e1b77";

    let by_staff = ledger
        .stock()
        .adjust_stock(Some(staff), adjustment(&p, MovementType::Exit, 1))
        .await
        .unwrap();
    assert_eq!(by_staff.movement.user_id.as_deref(), Some(staff));

    let fallback = ledger
        .stock()
        .adjust_stock(Some("not-a-uuid"), adjustment(&p, MovementType::Exit, 1))
        .await
        .unwrap();
    assert_eq!(fallback.movement.user_id, Some(admin));
}

// =============================================================================
// Amount overflow
// =============================================================================

#[tokio::test]
async fn test_ledger_amount_overflow_writes_nothing() {
    let (ledger, _) = ledger().await;
    let p = product(&ledger, "Ecrã OLED", 0, 12_000_000, 10_000_000).await;

    let mut purchase = adjustment(&p, MovementType::Entry, 1_000_000_000_000);
    purchase.record_financial = true;
    let err = ledger.stock().adjust_stock(None, purchase).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(ledger.stock().get_product(&p.id).await.unwrap().stock, 0);
    assert!(ledger.stock().list_movements(Some(&p.id)).await.unwrap().is_empty());
    assert!(ledger.finance().list_transactions(None).await.unwrap().is_empty());

    let refused = ledger
        .stock()
        .create_product(
            None,
            NewProduct {
                name: "Ecrã OLED (lote)".into(),
                category: "Ecrãs".into(),
                price_cents: 12_000_000,
                cost_cents: 10_000_000,
                stock: 1_000_000_000_000,
                min_stock: 0,
            },
        )
        .await;
    assert_eq!(kind(refused), ErrorKind::Validation);
    assert_eq!(ledger.stock().list_products().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_service_part_cost_overflow_consumes_nothing() {
    let (ledger, _) = ledger().await;
    let bulk = product(&ledger, "Parafuso", 1_000_000_000_000, 0, 0).await;
    ledger
        .stock()
        .update_product(
            None,
            &bulk.id,
            ProductPatch {
                cost_cents: Some(10_000_000),
                ..ProductPatch::default()
            },
        )
        .await
        .unwrap();

    let err = ledger
        .services()
        .create_service_order(
            None,
            repair("Ana", "A10", 2_000),
            vec![PartRequest {
                product_id: bulk.id.clone(),
                quantity: 1_000_000_000_000,
            }],
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let after = ledger.stock().get_product(&bulk.id).await.unwrap();
    assert_eq!(after.stock, 1_000_000_000_000);
    assert_eq!(ledger.stock().list_movements(Some(&bulk.id)).await.unwrap().len(), 1);
    assert!(ledger.services().list_service_orders().await.unwrap().is_empty());
}

// =============================================================================
// Concurrent writers (file-backed store, several connections)
// =============================================================================

async fn file_ledger(dir: &tempfile::TempDir) -> ShopLedger {
    let mut config = LedgerConfig::default();
    config.database.path = dir.path().join("ledger.db");
    config.database.max_connections = 5;
    open(config).await.0
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_exits_never_oversell() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = file_ledger(&dir).await;
    let p = product(&ledger, "Ecrã A10", 10, 1_500, 1_000).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            let exit = adjustment(&p, MovementType::Exit, 3);
            tokio::spawn(async move { ledger.stock().adjust_stock(None, exit).await })
        })
        .collect();

    let mut sold = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::InsufficientStock);
                refused += 1;
            }
        }
    }
    assert_eq!(sold, 3);
    assert_eq!(refused, 5);

    let after = ledger.stock().get_product(&p.id).await.unwrap();
    assert_eq!(after.stock, 1);
    let net = ledger.database().movements().net_quantity(&p.id).await.unwrap();
    assert_eq!(net, after.stock);

    let sales = ledger
        .finance()
        .list_transactions(None)
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.transaction_type == TransactionType::Income)
        .count();
    assert_eq!(sales, 3);

    ledger.database().close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_edits_and_adjustments_all_commit() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = file_ledger(&dir).await;
    let p = product(&ledger, "Bateria", 20, 500, 300).await;

    let mut handles = Vec::new();
    for i in 0..4 {
        let entries = ledger.clone();
        let entry = adjustment(&p, MovementType::Entry, 1);
        handles.push(tokio::spawn(async move {
            entries.stock().adjust_stock(None, entry).await.map(|_| ())
        }));

        let edits = ledger.clone();
        let id = p.id.clone();
        handles.push(tokio::spawn(async move {
            edits
                .stock()
                .update_product(
                    None,
                    &id,
                    ProductPatch {
                        stock: Some(30 + i),
                        ..ProductPatch::default()
                    },
                )
                .await
                .map(|_| ())
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let after = ledger.stock().get_product(&p.id).await.unwrap();
    let net = ledger.database().movements().net_quantity(&p.id).await.unwrap();
    assert_eq!(net, after.stock);
    assert!(after.stock >= 30);

    ledger.database().close().await;
}
