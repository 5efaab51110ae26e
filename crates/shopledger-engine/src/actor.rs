//! # Actor Resolution
//!
//! Decides which user id a movement or audit entry is attributed to.
//!
//! ```text
//! candidate ──► well-formed UUID? ── yes ──► candidate
//!                     │
//!                     no / absent
//!                     ▼
//!               fallback (first admin, fixed id, ...) ──► Some(id) | None
//! ```
//!
//! `None` is a valid outcome: the write proceeds with an empty actor.

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use shopledger_db::Database;

/// Resolves the acting user for an operation.
#[async_trait]
pub trait ActorResolver: Send + Sync + std::fmt::Debug {
    async fn resolve(&self, candidate: Option<&str>) -> Option<String>;
}

fn well_formed(candidate: Option<&str>) -> Option<String> {
    let candidate = candidate?.trim();
    Uuid::parse_str(candidate).ok().map(|_| candidate.to_string())
}

/// Production resolver: unusable candidates fall back to an admin.
#[derive(Debug, Clone)]
pub struct AdminFallbackResolver {
    db: Database,
}

impl AdminFallbackResolver {
    pub fn new(db: Database) -> Self {
        AdminFallbackResolver { db }
    }
}

#[async_trait]
impl ActorResolver for AdminFallbackResolver {
    async fn resolve(&self, candidate: Option<&str>) -> Option<String> {
        if let Some(id) = well_formed(candidate) {
            return Some(id);
        }

        match self.db.users().first_admin().await {
            Ok(Some(admin)) => Some(admin.id),
            Ok(None) => {
                warn!(?candidate, "No admin user to attribute the operation to");
                None
            }
            Err(e) => {
                warn!(error = %e, "Actor lookup failed, recording without actor");
                None
            }
        }
    }
}

/// Deterministic resolver: unusable candidates fall back to a fixed id.
#[derive(Debug, Clone, Default)]
pub struct StaticActorResolver {
    fallback: Option<String>,
}

impl StaticActorResolver {
    pub fn new(fallback: Option<String>) -> Self {
        StaticActorResolver { fallback }
    }
}

#[async_trait]
impl ActorResolver for StaticActorResolver {
    async fn resolve(&self, candidate: Option<&str>) -> Option<String> {
        well_formed(candidate).or_else(|| self.fallback.clone())
    }
}
