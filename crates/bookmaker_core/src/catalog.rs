//! crates/bookmaker_core/src/catalog.rs
//!
//! Session-scoped cache of the achievement catalog.

use crate::domain::AchievementDefinition;
use crate::ports::{CatalogSource, PortError, PortResult};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub type Catalog = Arc<[AchievementDefinition]>;

/// Loads the catalog once and hands out shared copies until reloaded or invalidated.
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    cached: RwLock<Option<Catalog>>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        Self {
            source,
            cached: RwLock::new(None),
        }
    }

    /// Returns the cached catalog, loading it on first use.
    pub async fn get(&self) -> PortResult<Catalog> {
        if let Some(catalog) = self.cached.read().await.as_ref() {
            return Ok(catalog.clone());
        }
        let mut slot = self.cached.write().await;
        // Another caller may have filled the slot while we waited for the lock.
        if let Some(catalog) = slot.as_ref() {
            return Ok(catalog.clone());
        }
        let catalog = self.load().await?;
        *slot = Some(catalog.clone());
        Ok(catalog)
    }

    /// Re-reads the source and replaces the cached copy. On failure the old copy stays.
    pub async fn reload(&self) -> PortResult<Catalog> {
        let catalog = self.load().await?;
        *self.cached.write().await = Some(catalog.clone());
        info!("Achievement catalog reloaded ({} definitions).", catalog.len());
        Ok(catalog)
    }

    /// Drops the cached copy; the next `get` reads the source again.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        debug!("Achievement catalog cache invalidated.");
    }

    async fn load(&self) -> PortResult<Catalog> {
        let definitions = self.source.load_catalog().await?;
        validate(&definitions)?;
        for def in &definitions {
            if let crate::rule::Rule::Unrecognized(_) = def.rule {
                warn!(
                    "Achievement '{}' has an unrecognized rule type {:?}; it will never unlock.",
                    def.id,
                    def.rule.type_tag()
                );
            }
        }
        debug!("Loaded {} achievement definitions.", definitions.len());
        Ok(definitions.into())
    }
}

/// Ids must be non-empty and unique across the catalog.
pub fn validate(definitions: &[AchievementDefinition]) -> PortResult<()> {
    let mut seen = HashSet::with_capacity(definitions.len());
    for def in definitions {
        if def.id.trim().is_empty() {
            return Err(PortError::Invalid(format!(
                "achievement '{}' has an empty id",
                def.name
            )));
        }
        if !seen.insert(def.id.as_str()) {
            return Err(PortError::Invalid(format!(
                "duplicate achievement id '{}'",
                def.id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Bounds, Rule, RuleKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        loads: AtomicUsize,
        ids: Vec<&'static str>,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn load_catalog(&self) -> PortResult<Vec<AchievementDefinition>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .ids
                .iter()
                .map(|id| AchievementDefinition {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    description: String::new(),
                    rule: Rule::Known(RuleKind::TotalReads(Bounds::at_least(1))),
                })
                .collect())
        }
    }

    fn source(ids: Vec<&'static str>) -> Arc<CountingSource> {
        Arc::new(CountingSource {
            loads: AtomicUsize::new(0),
            ids,
        })
    }

    #[tokio::test]
    async fn loads_once_until_reloaded() {
        let src = source(vec!["first", "second"]);
        let cache = CatalogCache::new(src.clone());

        assert_eq!(cache.get().await.unwrap().len(), 2);
        cache.get().await.unwrap();
        assert_eq!(src.loads.load(Ordering::SeqCst), 1);

        cache.reload().await.unwrap();
        assert_eq!(src.loads.load(Ordering::SeqCst), 2);

        cache.invalidate().await;
        cache.get().await.unwrap();
        assert_eq!(src.loads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn duplicate_ids_fail_the_load() {
        let cache = CatalogCache::new(source(vec!["same", "same"]));
        assert!(matches!(cache.get().await, Err(PortError::Invalid(_))));
    }
}
