//! crates/bookmaker_core/src/engine.rs
//!
//! The evaluation driver: one serialized pass from stored state to new unlocks.

use crate::catalog::{Catalog, CatalogCache};
use crate::context::EvaluationContext;
use crate::date::CalendarDate;
use crate::domain::{AchievementDefinition, ActionCounters, Book, LastEvent, UnlockEntry};
use crate::error::EngineError;
use crate::evaluator;
use crate::ports::{CatalogSource, PortResult, UnlockStore};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Runs evaluation passes against one unlock store.
///
/// Passes are serialized: two concurrent callers never observe the same locked
/// state, so an achievement is unlocked at most once.
pub struct AchievementEngine {
    catalog: CatalogCache,
    unlocks: Arc<dyn UnlockStore>,
    pass_lock: Mutex<()>,
}

impl AchievementEngine {
    pub fn new(source: Arc<dyn CatalogSource>, unlocks: Arc<dyn UnlockStore>) -> Self {
        Self {
            catalog: CatalogCache::new(source),
            unlocks,
            pass_lock: Mutex::new(()),
        }
    }

    /// Evaluates every locked achievement and persists the ones that now pass.
    ///
    /// `now` is read once by the caller; every rule in the pass sees the same
    /// today, week and month. Returns the newly unlocked definitions in catalog
    /// order. On error nothing has been persisted.
    pub async fn evaluate_and_unlock(
        &self,
        books: &[Book],
        counters: &ActionCounters,
        last_event: Option<&LastEvent>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AchievementDefinition>, EngineError> {
        let _pass = self.pass_lock.lock().await;

        let catalog = self.catalog.get().await.map_err(EngineError::Catalog)?;
        let unlocked: HashSet<String> = self
            .unlocks
            .list_unlocks()
            .await
            .map_err(EngineError::UnlockState)?
            .into_iter()
            .map(|entry| entry.id)
            .collect();

        let ctx = EvaluationContext::build(books, CalendarDate::today(now));
        let newly = evaluator::newly_passing(&catalog, &unlocked, &ctx, counters, last_event);
        debug!(
            "Evaluated {} definitions ({} already unlocked, event {:?}): {} pass.",
            catalog.len(),
            unlocked.len(),
            last_event.map(|e| e.kind),
            newly.len()
        );
        if newly.is_empty() {
            return Ok(Vec::new());
        }

        let entries: Vec<UnlockEntry> = newly
            .iter()
            .map(|def| UnlockEntry {
                id: def.id.clone(),
                acquired_at: now,
            })
            .collect();
        self.unlocks
            .record_unlocks(&entries)
            .await
            .map_err(EngineError::Persist)?;

        for def in &newly {
            info!("Achievement unlocked: {} ({})", def.id, def.name);
        }
        Ok(newly.into_iter().cloned().collect())
    }

    pub async fn catalog(&self) -> PortResult<Catalog> {
        self.catalog.get().await
    }

    pub async fn reload_catalog(&self) -> PortResult<Catalog> {
        self.catalog.reload().await
    }

    pub async fn invalidate_catalog(&self) {
        self.catalog.invalidate().await
    }

    pub async fn unlocks(&self) -> PortResult<Vec<UnlockEntry>> {
        self.unlocks.list_unlocks().await
    }
}
