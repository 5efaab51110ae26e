//! # Analytics Engine
//!
//! Serves product analytics from the cache, recomputing from movement
//! history on a miss. One product's unreadable history degrades that item
//! only; the batch always completes.

use std::sync::Arc;

use tracing::{debug, info, warn};

use shopledger_core::analytics::{analyze, summarize, AnalyticsSummary, ProductHistory};

use crate::cache::AnalyticsBatch;
use crate::context::EngineContext;
use crate::error::EngineResult;

#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    ctx: EngineContext,
}

impl AnalyticsEngine {
    pub(crate) fn new(ctx: EngineContext) -> Self {
        AnalyticsEngine { ctx }
    }

    /// Analytics for every non-deleted product, in registration order.
    ///
    /// Reads within the cache TTL return the same shared batch.
    pub async fn analyze_products(&self) -> EngineResult<AnalyticsBatch> {
        let cache = &self.ctx.cache;
        if let Some(batch) = cache.get() {
            debug!(products = batch.len(), "Analytics cache hit");
            return Ok(batch);
        }

        let generation = cache.generation();
        let products = self.ctx.db.products().list_active_in_order().await?;
        let movements = self.ctx.db.movements();

        let mut histories = Vec::with_capacity(products.len());
        for product in products {
            let history = movements.history(&product.id).await.map_err(|e| {
                warn!(product_id = %product.id, error = %e, "Movement history unavailable");
                e.to_string()
            });
            histories.push(ProductHistory {
                product,
                movements: history,
            });
        }

        let policy = self.ctx.config.analytics.policy();
        let batch: AnalyticsBatch = Arc::new(analyze(&histories, self.ctx.now(), &policy));

        let degraded = batch.iter().filter(|a| a.outcome.is_degraded()).count();
        let cached = cache.store_if_current(generation, Arc::clone(&batch));
        info!(products = batch.len(), degraded, cached, "Analytics recomputed");

        Ok(batch)
    }

    /// Top sellers, alerts and metrics over the current analytics.
    pub async fn get_analytics_summary(&self) -> EngineResult<AnalyticsSummary> {
        let batch = self.analyze_products().await?;
        Ok(summarize(&batch, &self.ctx.config.analytics.policy()))
    }

    /// Forces the next read to recompute.
    pub fn invalidate(&self) {
        self.ctx.invalidate_analytics();
    }
}
