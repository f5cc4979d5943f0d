//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use bookmaker_core::ports::{BookStore, CounterStore};
use bookmaker_core::AchievementEngine;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub books: Arc<dyn BookStore>,
    pub counters: Arc<dyn CounterStore>,
    /// Owns the catalog cache and serializes evaluation passes.
    pub engine: Arc<AchievementEngine>,
}
