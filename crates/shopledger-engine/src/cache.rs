//! # Analytics Cache
//!
//! Holds the last computed analytics batch for a fixed time-to-live.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get() ── fresh entry? ── yes ──► Arc clone (same allocation)           │
//! │              │                                                          │
//! │              no                                                         │
//! │              ▼                                                          │
//! │  generation() ─► recompute (awaits store) ─► store_if_current(gen, v)   │
//! │                                                   │                     │
//! │               invalidate() bumped the generation? ┤                     │
//! │                          yes: result returned, not cached               │
//! │                          no:  cached until ttl elapses                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is a `std::sync::RwLock` and is never held across an `.await`.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use shopledger_core::analytics::ProductAnalytics;
use shopledger_core::Clock;

/// Shared analytics batch handed to readers.
pub type AnalyticsBatch = Arc<Vec<ProductAnalytics>>;

#[derive(Debug)]
struct CachedBatch {
    computed_at: DateTime<Utc>,
    batch: AnalyticsBatch,
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entry: Option<CachedBatch>,
}

/// Time-boxed cache for the analytics batch.
#[derive(Debug)]
pub struct AnalyticsCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
}

impl AnalyticsCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        AnalyticsCache {
            ttl,
            clock,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// The cached batch, if one exists and is younger than the TTL.
    pub fn get(&self) -> Option<AnalyticsBatch> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let entry = state.entry.as_ref()?;

        // a clock that moved backwards reads as expired
        let fresh = (self.clock.now() - entry.computed_at)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(false);

        fresh.then(|| Arc::clone(&entry.batch))
    }

    /// Current generation. Take it before starting a recompute.
    pub fn generation(&self) -> u64 {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    /// Stores `batch` unless the cache was invalidated since `generation`.
    ///
    /// Returns whether the batch was stored.
    pub fn store_if_current(&self, generation: u64, batch: AnalyticsBatch) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.generation != generation {
            debug!(
                started = generation,
                current = state.generation,
                "Discarding analytics computed before an invalidation"
            );
            return false;
        }

        state.entry = Some(CachedBatch {
            computed_at: self.clock.now(),
            batch,
        });
        true
    }

    /// Drops the cached batch and fences off in-flight recomputes.
    pub fn invalidate(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.generation = state.generation.wrapping_add(1);
        state.entry = None;
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
