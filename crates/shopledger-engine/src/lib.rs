//! # shopledger-engine: Atomic Operations for ShopLedger
//!
//! Sequences the pure rules of `shopledger-core` and the repositories of
//! `shopledger-db` into operations that commit or fail as a whole.
//!
//! ## Module Organization
//! ```text
//! shopledger_engine/
//! ├── lib.rs        ◄─── You are here (ShopLedger façade, tracing setup)
//! ├── context.rs    ◄─── Shared handles + per-operation helpers
//! ├── stock.rs      ◄─── StockEngine: adjust_stock, movements
//! ├── product.rs    ◄─── StockEngine: product lifecycle
//! ├── service.rs    ◄─── ServiceEngine: repair orders consuming parts
//! ├── analytics.rs  ◄─── AnalyticsEngine over the cache
//! ├── cache.rs      ◄─── AnalyticsCache (TTL + generation fence)
//! ├── finance.rs    ◄─── FinanceEngine: ledger, dashboard, petty cash
//! ├── actor.rs      ◄─── ActorResolver capability
//! ├── audit.rs      ◄─── AuditSink capability
//! ├── notify.rs     ◄─── broadcast Notifier
//! ├── config.rs     ◄─── LedgerConfig (TOML + env)
//! └── error.rs      ◄─── EngineError → ErrorResponse
//! ```
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate ─► resolve actor ─► BEGIN ─► guarded writes ─► COMMIT         │
//! │                                  │                          │           │
//! │                       any error: dropped tx rolls back      ▼           │
//! │                                                  audit · invalidate ·   │
//! │                                                  broadcast (best effort)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use shopledger_core::{MovementType, StockAdjustment};
//! use shopledger_engine::{LedgerConfig, ShopLedger};
//!
//! # async fn demo() -> Result<(), shopledger_engine::EngineError> {
//! let ledger = ShopLedger::open(LedgerConfig::load_or_default(None)).await?;
//! let result = ledger
//!     .stock()
//!     .adjust_stock(None, StockAdjustment {
//!         product_id: "...".into(),
//!         direction: MovementType::Exit,
//!         quantity: 2,
//!         reason: None,
//!         record_financial: false,
//!     })
//!     .await?;
//! println!("stock now {}", result.product.stock);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod analytics;
pub mod audit;
pub mod cache;
pub mod config;
mod context;
pub mod error;
pub mod finance;
pub mod notify;
pub mod product;
pub mod service;
pub mod stock;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopledger_core::{Clock, SystemClock};
use shopledger_db::Database;

pub use actor::{ActorResolver, AdminFallbackResolver, StaticActorResolver};
pub use analytics::AnalyticsEngine;
pub use audit::{AuditSink, StoreAuditSink};
pub use cache::{AnalyticsBatch, AnalyticsCache};
pub use config::LedgerConfig;
pub use error::{EngineError, EngineResult, ErrorKind, ErrorResponse};
pub use finance::FinanceEngine;
pub use notify::{ChangeEvent, Entity, Notifier};
pub use product::ProductUpdate;
pub use service::ServiceEngine;
pub use stock::{StockAdjustmentResult, StockEngine};

use context::EngineContext;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` overrides the default `info,shopledger=debug,sqlx=warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopledger=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// =============================================================================
// Façade
// =============================================================================

/// Entry point for callers: one store, one clock, one notifier, shared by
/// every engine. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ShopLedger {
    ctx: EngineContext,
}

impl ShopLedger {
    /// Opens the store described by `config` with production capabilities.
    pub async fn open(config: LedgerConfig) -> EngineResult<Self> {
        ShopLedgerBuilder::new(config).build().await
    }

    pub fn builder(config: LedgerConfig) -> ShopLedgerBuilder {
        ShopLedgerBuilder::new(config)
    }

    pub fn stock(&self) -> StockEngine {
        StockEngine::new(self.ctx.clone())
    }

    pub fn services(&self) -> ServiceEngine {
        ServiceEngine::new(self.ctx.clone())
    }

    pub fn analytics(&self) -> AnalyticsEngine {
        AnalyticsEngine::new(self.ctx.clone())
    }

    pub fn finance(&self) -> FinanceEngine {
        FinanceEngine::new(self.ctx.clone())
    }

    pub fn notifier(&self) -> &Notifier {
        &self.ctx.notifier
    }

    /// Receives every change event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.ctx.notifier.subscribe()
    }

    pub fn database(&self) -> &Database {
        &self.ctx.db
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.ctx.config
    }

    pub async fn close(&self) {
        self.ctx.db.close().await;
    }
}

/// Builds a [`ShopLedger`], optionally swapping the clock, the actor
/// resolver or the audit sink.
#[derive(Debug)]
pub struct ShopLedgerBuilder {
    config: LedgerConfig,
    clock: Option<Arc<dyn Clock>>,
    actors: Option<Arc<dyn ActorResolver>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl ShopLedgerBuilder {
    pub fn new(config: LedgerConfig) -> Self {
        ShopLedgerBuilder {
            config,
            clock: None,
            actors: None,
            audit: None,
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn actor_resolver(mut self, actors: Arc<dyn ActorResolver>) -> Self {
        self.actors = Some(actors);
        self
    }

    pub fn audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub async fn build(self) -> EngineResult<ShopLedger> {
        self.config.validate()?;

        let db = Database::new(self.config.database.db_config()).await?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let notifier = Notifier::new(self.config.notifications.channel_capacity);

        let actors = self
            .actors
            .unwrap_or_else(|| Arc::new(AdminFallbackResolver::new(db.clone())));
        let audit = self.audit.unwrap_or_else(|| {
            Arc::new(StoreAuditSink::new(
                db.clone(),
                notifier.clone(),
                Arc::clone(&clock),
            ))
        });
        let cache = Arc::new(AnalyticsCache::new(
            self.config.analytics.cache_ttl(),
            Arc::clone(&clock),
        ));

        info!(
            database = ?self.config.database.path,
            enforce_cash_balance = self.config.finance.enforce_cash_balance,
            "ShopLedger ready"
        );

        Ok(ShopLedger {
            ctx: EngineContext {
                db,
                clock,
                actors,
                audit,
                notifier,
                cache,
                config: Arc::new(self.config),
            },
        })
    }
}
