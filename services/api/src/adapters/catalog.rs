//! services/api/src/adapters/catalog.rs
//!
//! Reads the achievement catalog from a JSON file on disk.

use async_trait::async_trait;
use bookmaker_core::domain::AchievementDefinition;
use bookmaker_core::ports::{CatalogSource, PortError, PortResult};
use std::path::PathBuf;
use tracing::debug;

/// A catalog source backed by a JSON array of achievement definitions.
#[derive(Clone, Debug)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn load_catalog(&self) -> PortResult<Vec<AchievementDefinition>> {
        debug!("Reading achievement catalog from {}", self.path.display());
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    PortError::NotFound(format!("catalog file {}", self.path.display()))
                }
                _ => PortError::Unexpected(e.to_string()),
            })?;

        serde_json::from_str(&raw).map_err(|e| {
            PortError::Invalid(format!("catalog file {}: {}", self.path.display(), e))
        })
    }
}
