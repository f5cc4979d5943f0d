//! crates/bookmaker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry serde derives so the catalog and book JSON share one shape,
//! but they are independent of any database.

use crate::date::{self, CalendarDate};
use crate::rule::Rule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

//=========================================================================================
// Books
//=========================================================================================

/// One reading instance of a title. Re-reads are separate records sharing a title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, with = "date::optional")]
    pub started_at: Option<CalendarDate>,
    /// `None` while the book is still being read.
    #[serde(default, with = "date::optional")]
    pub finished_at: Option<CalendarDate>,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub one_liner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Builds a fresh record from user input, trimming title and author.
    pub fn from_draft(draft: BookDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            author: draft.author.trim().to_string(),
            started_at: draft.started_at,
            finished_at: draft.finished_at,
            review_text: draft.review_text,
            one_liner: draft.one_liner,
            rating: draft.rating,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a partial update; fields left `None` in the patch are kept.
    pub fn apply(&mut self, patch: BookPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title.trim().to_string();
        }
        if let Some(author) = patch.author {
            self.author = author.trim().to_string();
        }
        if let Some(started_at) = patch.started_at {
            self.started_at = started_at;
        }
        if let Some(finished_at) = patch.finished_at {
            self.finished_at = finished_at;
        }
        if let Some(review_text) = patch.review_text {
            self.review_text = review_text;
        }
        if let Some(one_liner) = patch.one_liner {
            self.one_liner = one_liner;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        self.updated_at = now;
    }

    pub fn trimmed_title(&self) -> &str {
        self.title.trim()
    }

    pub fn trimmed_author(&self) -> &str {
        self.author.trim()
    }

    /// The rating, if one in 1..=5 has been set. Older clients stored 0 for "unrated".
    pub fn rating(&self) -> Option<u8> {
        self.rating.filter(|r| (1..=5).contains(r))
    }
}

/// User input for a new book.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, with = "date::optional")]
    pub started_at: Option<CalendarDate>,
    #[serde(default, with = "date::optional")]
    pub finished_at: Option<CalendarDate>,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub one_liner: String,
    #[serde(default)]
    pub rating: Option<u8>,
}

/// A partial update. The date and rating fields are doubly optional so a patch
/// can clear them: absent keeps the value, `""`/`null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "patch_date")]
    pub started_at: Option<Option<CalendarDate>>,
    #[serde(default, deserialize_with = "patch_date")]
    pub finished_at: Option<Option<CalendarDate>>,
    pub review_text: Option<String>,
    pub one_liner: Option<String>,
    #[serde(default, deserialize_with = "patch_rating")]
    pub rating: Option<Option<u8>>,
}

fn patch_date<'de, D>(deserializer: D) -> Result<Option<Option<CalendarDate>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    date::optional::deserialize(deserializer).map(Some)
}

fn patch_rating<'de, D>(deserializer: D) -> Result<Option<Option<u8>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<u8>::deserialize(deserializer).map(Some)
}

//=========================================================================================
// Achievements
//=========================================================================================

/// An externally authored achievement. Never mutated after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule: Rule,
}

/// Written exactly once per achievement id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockEntry {
    pub id: String,
    pub acquired_at: DateTime<Utc>,
}

//=========================================================================================
// Events and Counters
//=========================================================================================

/// The user action that triggered an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Save,
    Edit,
    Delete,
    Search,
    Backup,
    Restore,
    Settings,
}

impl EventKind {
    /// The action counter this event bumps, if it maps onto a plain counter.
    pub fn counter_key(&self) -> Option<&'static str> {
        match self {
            EventKind::Search => Some(counter_names::SEARCH),
            EventKind::Backup => Some(counter_names::EXPORT),
            EventKind::Restore => Some(counter_names::IMPORT),
            EventKind::Delete => Some(counter_names::DELETE),
            EventKind::Settings => Some(counter_names::SETTINGS_SAVED),
            EventKind::Save | EventKind::Edit => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<Book>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<u64>,
    /// The mutation behind this event stored a rating.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub rating_set: bool,
}

impl LastEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            book: None,
            duration_sec: None,
            rating_set: false,
        }
    }

    pub fn with_book(kind: EventKind, book: Book) -> Self {
        Self {
            kind,
            book: Some(book),
            duration_sec: None,
            rating_set: false,
        }
    }

    pub fn with_rating_set(mut self, rating_set: bool) -> Self {
        self.rating_set = rating_set;
        self
    }
}

pub mod counter_names {
    pub const SEARCH: &str = "searchCount";
    pub const EXPORT: &str = "exportCount";
    pub const IMPORT: &str = "importCount";
    pub const DELETE: &str = "deleteCount";
    pub const SETTINGS_SAVED: &str = "settingsSaved";
    pub const RATE: &str = "rateCount";
    pub const FAST_CREATE: &str = "fastCreateCount";
}

/// Auxiliary counters that cannot be derived from the book records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCounters {
    #[serde(default)]
    pub actions: BTreeMap<String, u64>,
    #[serde(default)]
    pub edit_counts: HashMap<Uuid, u64>,
}

impl ActionCounters {
    pub fn get(&self, name: &str) -> u64 {
        self.actions.get(name).copied().unwrap_or(0)
    }

    pub fn bump(&mut self, name: &str) {
        *self.actions.entry(name.to_string()).or_insert(0) += 1;
    }

    pub fn bump_edit(&mut self, book_id: Uuid) {
        *self.edit_counts.entry(book_id).or_insert(0) += 1;
    }
}
