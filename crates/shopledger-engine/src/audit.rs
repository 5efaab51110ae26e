//! # Audit Sink
//!
//! Records who did what, and forwards each entry to clients as `new-log`.
//!
//! Engines call the sink after commit. A failing sink never undoes the
//! operation; the engine logs the failure and moves on.

use std::sync::Arc;

use async_trait::async_trait;

use shopledger_core::{Clock, SystemLog};
use shopledger_db::{generate_id, Database, LogRepository};

use crate::error::EngineResult;
use crate::notify::{ChangeEvent, Notifier};

// Action names
pub const PRODUCT_CREATE: &str = "PRODUCT_CREATE";
pub const PRODUCT_UPDATE: &str = "PRODUCT_UPDATE";
pub const PRODUCT_DELETE: &str = "PRODUCT_DELETE";
pub const STOCK_ADJUST: &str = "STOCK_ADJUST";
pub const SERVICE_CREATE: &str = "SERVICE_CREATE";
pub const SERVICE_UPDATE: &str = "SERVICE_UPDATE";
pub const SERVICE_DELETE: &str = "SERVICE_DELETE";
pub const FINANCE_CREATE: &str = "FINANCE_CREATE";
pub const PETTY_CASH_CREATE: &str = "PETTY_CASH_CREATE";

// Categories
pub const INVENTORY: &str = "INVENTORY";
pub const SERVICES: &str = "SERVICES";
pub const FINANCE: &str = "FINANCE";

#[async_trait]
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    async fn record(
        &self,
        actor: Option<&str>,
        action: &str,
        category: &str,
        details: &str,
    ) -> EngineResult<SystemLog>;
}

/// Writes to `system_logs` and emits `new-log`.
#[derive(Debug, Clone)]
pub struct StoreAuditSink {
    db: Database,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
}

impl StoreAuditSink {
    pub fn new(db: Database, notifier: Notifier, clock: Arc<dyn Clock>) -> Self {
        StoreAuditSink { db, notifier, clock }
    }
}

#[async_trait]
impl AuditSink for StoreAuditSink {
    async fn record(
        &self,
        actor: Option<&str>,
        action: &str,
        category: &str,
        details: &str,
    ) -> EngineResult<SystemLog> {
        let log = SystemLog {
            id: generate_id(),
            user_id: actor.map(str::to_string),
            action: action.to_string(),
            category: category.to_string(),
            details: details.to_string(),
            created_at: self.clock.now(),
        };

        LogRepository::insert(self.db.pool(), &log).await?;
        self.notifier.emit(ChangeEvent::NewLog(log.clone()));

        Ok(log)
    }
}
