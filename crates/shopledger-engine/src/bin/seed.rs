//! # Demo Data Seeder
//!
//! Populates a ShopLedger store with a small phone-repair shop: an admin,
//! a parts catalogue, some sales, a few repair orders and petty cash.
//!
//! ## Usage
//! ```bash
//! # Seed the database named in shopledger.toml (or ./shopledger.db)
//! cargo run -p shopledger-engine --bin shopledger-seed
//!
//! # Seed a specific file
//! cargo run -p shopledger-engine --bin shopledger-seed -- --db ./data/shop.db
//! ```
//!
//! Every write goes through the engines, so the seeded store satisfies the
//! same invariants as a live one (stock equals the movement sum, every sale
//! has its ledger entry).

use std::env;
use std::path::PathBuf;

use chrono::Utc;
use tracing::info;

use shopledger_core::{
    MovementType, NewPettyCash, NewProduct, NewServiceOrder, NewTransaction, PartRequest,
    PettyCashType, ServiceOrderPatch, ServiceStatus, StockAdjustment, TransactionStatus,
    TransactionType, User, UserRole,
};
use shopledger_db::{generate_id, UserRepository};
use shopledger_engine::{init_tracing, LedgerConfig, ShopLedger};

/// (name, category, price cents, cost cents, stock, min stock)
const CATALOGUE: &[(&str, &str, i64, i64, i64, i64)] = &[
    ("Ecrã Samsung A10", "Ecrãs", 150_000, 95_000, 8, 2),
    ("Ecrã iPhone 11", "Ecrãs", 420_000, 310_000, 4, 1),
    ("Bateria Samsung A20", "Baterias", 65_000, 38_000, 15, 5),
    ("Bateria iPhone X", "Baterias", 90_000, 55_000, 6, 3),
    ("Conector de Carga USB-C", "Peças", 12_000, 4_500, 40, 10),
    ("Capa de Silicone", "Acessórios", 25_000, 9_000, 30, 5),
    ("Película de Vidro", "Acessórios", 15_000, 3_000, 60, 20),
    ("Carregador Rápido 25W", "Acessórios", 80_000, 45_000, 12, 4),
];

/// (catalogue index, quantity)
const SALES: &[(usize, i64)] = &[(5, 4), (6, 12), (6, 7), (7, 3), (2, 2), (5, 1)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ShopLedger Demo Seeder");
                println!();
                println!("Usage: shopledger-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -d, --db <PATH>      Database file, overrides the config");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let mut config = LedgerConfig::load_or_default(config_path);
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("ShopLedger Demo Seeder");
    println!("======================");
    println!("Database: {}", config.database.path.display());
    println!();

    let ledger = ShopLedger::open(config).await?;

    let existing = ledger.database().products().count().await?;
    if existing > 0 {
        println!("Database already has {} products, skipping seed.", existing);
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    // Admin user: unattributed operations fall back to it
    let admin = User {
        id: generate_id(),
        name: "Administrador".into(),
        email: "admin@shopledger.local".into(),
        role: UserRole::Admin,
        created_at: Utc::now(),
    };
    UserRepository::insert(ledger.database().pool(), &admin).await?;
    println!("✓ Admin user {}", admin.email);

    // Opening capital, so stock purchases have a balance to draw on
    let finance = ledger.finance();
    finance
        .record_transaction(
            Some(&admin.id),
            NewTransaction {
                transaction_type: TransactionType::Income,
                amount_cents: 5_000_000,
                cost_amount_cents: None,
                category: "Capital".into(),
                status: TransactionStatus::Paid,
                description: "Capital inicial".into(),
                client_name: None,
                payment_method: Some("Transferência".into()),
                date: None,
                due_date: None,
            },
        )
        .await?;

    let stock = ledger.stock();
    let mut product_ids = Vec::with_capacity(CATALOGUE.len());
    for (name, category, price, cost, initial, min_stock) in CATALOGUE {
        let product = stock
            .create_product(
                Some(&admin.id),
                NewProduct {
                    name: (*name).into(),
                    category: (*category).into(),
                    price_cents: *price,
                    cost_cents: *cost,
                    stock: *initial,
                    min_stock: *min_stock,
                },
            )
            .await?;
        product_ids.push(product.id);
    }
    println!("✓ {} products", product_ids.len());

    for (index, quantity) in SALES {
        stock
            .adjust_stock(
                Some(&admin.id),
                StockAdjustment {
                    product_id: product_ids[*index].clone(),
                    direction: MovementType::Exit,
                    quantity: *quantity,
                    reason: None,
                    record_financial: false,
                },
            )
            .await?;
    }
    stock
        .adjust_stock(
            Some(&admin.id),
            StockAdjustment {
                product_id: product_ids[4].clone(),
                direction: MovementType::Entry,
                quantity: 20,
                reason: Some("Reposição fornecedor".into()),
                record_financial: true,
            },
        )
        .await?;
    println!("✓ {} sales and 1 restock", SALES.len());

    let services = ledger.services();
    let screen_job = services
        .create_service_order(
            Some(&admin.id),
            NewServiceOrder {
                client_name: "Ana Macuácua".into(),
                client_phone: Some("+258 84 000 0001".into()),
                device_model: "Samsung A10".into(),
                description: Some("Ecrã partido".into()),
                price_cents: 220_000,
                ..NewServiceOrder::default()
            },
            vec![PartRequest {
                product_id: product_ids[0].clone(),
                quantity: 1,
            }],
        )
        .await?;
    services
        .update_service_order(
            Some(&admin.id),
            &screen_job.order.id,
            ServiceOrderPatch {
                status: Some(ServiceStatus::Delivered),
                ..ServiceOrderPatch::default()
            },
        )
        .await?;

    services
        .create_service_order(
            Some(&admin.id),
            NewServiceOrder {
                client_name: "Carlos Tembe".into(),
                device_model: "iPhone X".into(),
                description: Some("Bateria não segura carga".into()),
                status: ServiceStatus::InProgress,
                price_cents: 130_000,
                ..NewServiceOrder::default()
            },
            vec![
                PartRequest {
                    product_id: product_ids[3].clone(),
                    quantity: 1,
                },
                PartRequest {
                    product_id: product_ids[4].clone(),
                    quantity: 1,
                },
            ],
        )
        .await?;
    println!("✓ 2 service orders");

    finance
        .record_petty_cash(
            Some(&admin.id),
            NewPettyCash {
                entry_type: PettyCashType::Deposit,
                amount_cents: 200_000,
                description: "Fundo de caixa".into(),
            },
        )
        .await?;
    finance
        .record_petty_cash(
            Some(&admin.id),
            NewPettyCash {
                entry_type: PettyCashType::Expense,
                amount_cents: 15_000,
                description: "Água e limpeza".into(),
            },
        )
        .await?;
    println!("✓ petty cash");

    let summary = finance.financial_summary(Utc::now()).await?;
    let analytics = ledger.analytics().get_analytics_summary().await?;

    info!(
        balance = %summary.balance,
        net_profit = %summary.net_profit,
        inventory_value = %summary.inventory_value,
        alerts = analytics.alerts.len(),
        "Seed complete"
    );

    println!();
    println!("Balance:         {}", summary.balance);
    println!("Net profit:      {}", summary.net_profit);
    println!("Inventory value: {}", summary.inventory_value);
    println!("Petty cash:      {}", finance.petty_cash_balance().await?);
    if let Some(top) = analytics.top_products.first() {
        println!("Top seller:      {} ({} un)", top.name, top.total_sales);
    }

    ledger.close().await;
    Ok(())
}
