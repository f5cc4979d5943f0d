//! crates/bookmaker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture: the engine only
//! sees in-memory values, and every store it reads or writes sits behind a port.

use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::{AchievementDefinition, ActionCounters, Book, UnlockEntry};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, files).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every book record, in no particular order.
    async fn list_books(&self) -> PortResult<Vec<Book>>;

    async fn get_book(&self, id: Uuid) -> PortResult<Book>;

    async fn create_book(&self, book: Book) -> PortResult<Book>;

    async fn update_book(&self, book: Book) -> PortResult<Book>;

    async fn delete_book(&self, id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Reads the achievement definitions, in catalog order.
    async fn load_catalog(&self) -> PortResult<Vec<AchievementDefinition>>;
}

#[async_trait]
pub trait UnlockStore: Send + Sync {
    async fn list_unlocks(&self) -> PortResult<Vec<UnlockEntry>>;

    /// Persists a batch of new unlocks. Either every entry is stored or none is.
    /// Entries whose id is already unlocked are left untouched.
    async fn record_unlocks(&self, entries: &[UnlockEntry]) -> PortResult<()>;
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn load_counters(&self) -> PortResult<ActionCounters>;

    async fn bump_action(&self, name: &str) -> PortResult<()>;

    async fn bump_edit(&self, book_id: Uuid) -> PortResult<()>;
}
