//! services/api/src/web/protocol.rs
//!
//! Defines the JSON payloads exchanged between the browser client and the API server.
//! Calendar dates travel as `YYYY-MM-DD` strings, with `""` meaning "not set".

use bookmaker_core::domain::{AchievementDefinition, Book, BookDraft, BookPatch, EventKind, UnlockEntry};
use bookmaker_core::{CalendarDate, ReadingStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Payloads Sent FROM the Client TO the Server
//=========================================================================================

/// Fields of a new book record.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub finished_at: String,
    #[serde(default)]
    pub review_text: String,
    #[serde(default)]
    pub one_liner: String,
    /// 1 to 5; 0 or absent means unrated.
    #[serde(default)]
    pub rating: Option<u8>,
    /// Seconds the client spent on the entry form.
    #[serde(default)]
    pub duration_sec: Option<u64>,
}

impl CreateBookRequest {
    pub fn into_draft(self) -> Result<BookDraft, String> {
        Ok(BookDraft {
            title: self.title,
            author: self.author,
            started_at: parse_optional_date("startedAt", &self.started_at)?,
            finished_at: parse_optional_date("finishedAt", &self.finished_at)?,
            review_text: self.review_text,
            one_liner: self.one_liner,
            rating: parse_rating(self.rating)?,
        })
    }
}

/// A partial update. Absent fields are kept; an empty date string clears the date
/// and a rating of 0 clears the rating.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub review_text: Option<String>,
    pub one_liner: Option<String>,
    pub rating: Option<u8>,
}

impl UpdateBookRequest {
    pub fn into_patch(self) -> Result<BookPatch, String> {
        Ok(BookPatch {
            title: self.title,
            author: self.author,
            started_at: self
                .started_at
                .map(|raw| parse_optional_date("startedAt", &raw))
                .transpose()?,
            finished_at: self
                .finished_at
                .map(|raw| parse_optional_date("finishedAt", &raw))
                .transpose()?,
            review_text: self.review_text,
            one_liner: self.one_liner,
            rating: self.rating.map(|r| parse_rating(Some(r))).transpose()?,
        })
    }
}

/// `GET /books` query parameters.
#[derive(Deserialize, IntoParams, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive text matched against title, author, review and one-liner.
    pub q: Option<String>,
}

/// User actions that only bump a counter before running a pass.
#[derive(Deserialize, Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Backup,
    Restore,
    Settings,
}

impl ActionKind {
    pub fn event(self) -> EventKind {
        match self {
            ActionKind::Backup => EventKind::Backup,
            ActionKind::Restore => EventKind::Restore,
            ActionKind::Settings => EventKind::Settings,
        }
    }
}

fn parse_optional_date(field: &str, raw: &str) -> Result<Option<CalendarDate>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    CalendarDate::parse(raw)
        .map(Some)
        .map_err(|e| format!("{}: {}", field, e))
}

fn parse_rating(rating: Option<u8>) -> Result<Option<u8>, String> {
    match rating {
        None | Some(0) => Ok(None),
        Some(r @ 1..=5) => Ok(Some(r)),
        Some(r) => Err(format!("rating must be between 1 and 5, got {}", r)),
    }
}

//=========================================================================================
// Payloads Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub started_at: String,
    pub finished_at: String,
    pub review_text: String,
    pub one_liner: String,
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        let date = |d: Option<CalendarDate>| d.map(|d| d.to_string()).unwrap_or_default();
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            started_at: date(book.started_at),
            finished_at: date(book.finished_at),
            review_text: book.review_text.clone(),
            one_liner: book.one_liner.clone(),
            rating: book.rating(),
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// An achievement unlocked by the pass that handled this request.
#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
pub struct UnlockedView {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<AchievementDefinition> for UnlockedView {
    fn from(def: AchievementDefinition) -> Self {
        Self {
            id: def.id,
            name: def.name,
            description: def.description,
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub book: BookView,
    pub newly_unlocked: Vec<UnlockedView>,
    /// The evaluation pass could not run; `newlyUnlocked` is empty and a later
    /// pass will unlock whatever is due.
    pub pass_failed: bool,
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookListResponse {
    pub books: Vec<BookView>,
    pub newly_unlocked: Vec<UnlockedView>,
    pub pass_failed: bool,
}

/// Response for mutations that return no record of their own.
#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PassResponse {
    pub newly_unlocked: Vec<UnlockedView>,
    pub pass_failed: bool,
}

/// One catalog entry with its unlock state.
#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rule_type: Option<String>,
    pub unlocked: bool,
    pub acquired_at: Option<DateTime<Utc>>,
}

impl AchievementView {
    pub fn new(def: &AchievementDefinition, entry: Option<&UnlockEntry>) -> Self {
        Self {
            id: def.id.clone(),
            name: def.name.clone(),
            description: def.description.clone(),
            rule_type: def.rule.type_tag(),
            unlocked: entry.is_some(),
            acquired_at: entry.map(|e| e.acquired_at),
        }
    }
}

#[derive(Serialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub definitions: usize,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct StatsResponse {
    #[schema(value_type = Object)]
    pub stats: ReadingStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_parses_dates_and_rating() {
        let req: CreateBookRequest = serde_json::from_str(
            r#"{"title": "Dune", "finishedAt": "2024-03-01", "startedAt": "", "rating": 0, "durationSec": 12}"#,
        )
        .unwrap();
        assert_eq!(req.duration_sec, Some(12));
        let draft = req.into_draft().unwrap();
        assert_eq!(draft.started_at, None);
        assert_eq!(draft.finished_at, CalendarDate::from_ymd(2024, 3, 1));
        assert_eq!(draft.rating, None);
    }

    #[test]
    fn bad_input_is_rejected() {
        let req = CreateBookRequest {
            finished_at: "2024-13-01".into(),
            ..Default::default()
        };
        assert!(req.into_draft().unwrap_err().starts_with("finishedAt"));

        let req = UpdateBookRequest {
            rating: Some(6),
            ..Default::default()
        };
        assert!(req.into_patch().is_err());
    }

    #[test]
    fn update_request_distinguishes_absent_from_cleared() {
        let patch: UpdateBookRequest =
            serde_json::from_str(r#"{"finishedAt": "", "rating": 0}"#).unwrap();
        let patch = patch.into_patch().unwrap();
        assert_eq!(patch.finished_at, Some(None));
        assert_eq!(patch.started_at, None);
        assert_eq!(patch.rating, Some(None));
    }
}
