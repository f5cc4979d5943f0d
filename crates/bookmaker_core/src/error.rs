//! crates/bookmaker_core/src/error.rs

use crate::ports::PortError;

/// Why an evaluation pass failed. No unlock is reported or persisted when it does.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to load the achievement catalog: {0}")]
    Catalog(#[source] PortError),

    #[error("Failed to read unlock state: {0}")]
    UnlockState(#[source] PortError),

    #[error("Failed to persist new unlocks: {0}")]
    Persist(#[source] PortError),
}
