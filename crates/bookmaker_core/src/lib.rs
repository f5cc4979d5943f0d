pub mod catalog;
pub mod context;
pub mod date;
pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod ports;
pub mod predicates;
pub mod rule;
pub mod stats;
pub mod streak;

pub use catalog::{Catalog, CatalogCache};
pub use context::EvaluationContext;
pub use date::{CalendarDate, IsoWeek, YearMonth};
pub use domain::{
    AchievementDefinition, ActionCounters, Book, BookDraft, BookPatch, EventKind, LastEvent,
    UnlockEntry,
};
pub use engine::AchievementEngine;
pub use error::EngineError;
pub use ports::{BookStore, CatalogSource, CounterStore, PortError, PortResult, UnlockStore};
pub use rule::{Rule, RuleKind};
pub use stats::ReadingStats;
