//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `BookStore`, `UnlockStore` and `CounterStore` ports from the `core` crate.
//! It handles all interactions with the SQLite database using `sqlx`.

use async_trait::async_trait;
use bookmaker_core::domain::{ActionCounters, Book, UnlockEntry};
use bookmaker_core::ports::{BookStore, CounterStore, PortError, PortResult, UnlockStore};
use bookmaker_core::CalendarDate;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct SqliteAdapter {
    pool: SqlitePool,
}

impl SqliteAdapter {
    /// Creates a new `SqliteAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn parse_id(raw: &str) -> PortResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| PortError::Invalid(format!("bad id '{}': {}", raw, e)))
}

fn parse_date(raw: Option<String>) -> PortResult<Option<CalendarDate>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => CalendarDate::parse(s)
            .map(Some)
            .map_err(|e| PortError::Invalid(e.to_string())),
    }
}

fn count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(0)
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct BookRecord {
    id: String,
    title: String,
    author: String,
    started_at: Option<String>,
    finished_at: Option<String>,
    review_text: String,
    one_liner: String,
    rating: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl BookRecord {
    fn to_domain(self) -> PortResult<Book> {
        Ok(Book {
            id: parse_id(&self.id)?,
            title: self.title,
            author: self.author,
            started_at: parse_date(self.started_at)?,
            finished_at: parse_date(self.finished_at)?,
            review_text: self.review_text,
            one_liner: self.one_liner,
            rating: self.rating.and_then(|r| u8::try_from(r).ok()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UnlockRecord {
    id: String,
    acquired_at: DateTime<Utc>,
}
impl UnlockRecord {
    fn to_domain(self) -> UnlockEntry {
        UnlockEntry {
            id: self.id,
            acquired_at: self.acquired_at,
        }
    }
}

#[derive(FromRow)]
struct CounterRecord {
    name: String,
    count: i64,
}

const BOOK_COLUMNS: &str = "id, title, author, started_at, finished_at, review_text, one_liner, rating, created_at, updated_at";

//=========================================================================================
// `BookStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl BookStore for SqliteAdapter {
    async fn list_books(&self) -> PortResult<Vec<Book>> {
        let records = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books ORDER BY created_at ASC, id ASC",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_book(&self, id: Uuid) -> PortResult<Book> {
        let record = sqlx::query_as::<_, BookRecord>(&format!(
            "SELECT {} FROM books WHERE id = ?",
            BOOK_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Book {} not found", id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn create_book(&self, book: Book) -> PortResult<Book> {
        sqlx::query(
            "INSERT INTO books (id, title, author, started_at, finished_at, review_text, one_liner, rating, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.started_at.map(|d| d.to_string()))
        .bind(book.finished_at.map(|d| d.to_string()))
        .bind(&book.review_text)
        .bind(&book.one_liner)
        .bind(book.rating.map(i64::from))
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(book)
    }

    async fn update_book(&self, book: Book) -> PortResult<Book> {
        let result = sqlx::query(
            "UPDATE books SET title = ?, author = ?, started_at = ?, finished_at = ?, review_text = ?, \
             one_liner = ?, rating = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.started_at.map(|d| d.to_string()))
        .bind(book.finished_at.map(|d| d.to_string()))
        .bind(&book.review_text)
        .bind(&book.one_liner)
        .bind(book.rating.map(i64::from))
        .bind(book.updated_at)
        .bind(book.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", book.id)));
        }
        Ok(book)
    }

    async fn delete_book(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Book {} not found", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `UnlockStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UnlockStore for SqliteAdapter {
    async fn list_unlocks(&self) -> PortResult<Vec<UnlockEntry>> {
        let records = sqlx::query_as::<_, UnlockRecord>(
            "SELECT id, acquired_at FROM unlocks ORDER BY acquired_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn record_unlocks(&self, entries: &[UnlockEntry]) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        for entry in entries {
            // An id that is already present keeps its first timestamp.
            sqlx::query("INSERT OR IGNORE INTO unlocks (id, acquired_at) VALUES (?, ?)")
                .bind(&entry.id)
                .bind(entry.acquired_at)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }
}

//=========================================================================================
// `CounterStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CounterStore for SqliteAdapter {
    async fn load_counters(&self) -> PortResult<ActionCounters> {
        let actions = sqlx::query_as::<_, CounterRecord>("SELECT name, count FROM action_counters")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        let edits = sqlx::query_as::<_, CounterRecord>(
            "SELECT book_id AS name, count FROM edit_counts",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut counters = ActionCounters::default();
        for record in actions {
            counters.actions.insert(record.name, count(record.count));
        }
        for record in edits {
            counters
                .edit_counts
                .insert(parse_id(&record.name)?, count(record.count));
        }
        Ok(counters)
    }

    async fn bump_action(&self, name: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO action_counters (name, count) VALUES (?, 1) \
             ON CONFLICT(name) DO UPDATE SET count = count + 1",
        )
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn bump_edit(&self, book_id: Uuid) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO edit_counts (book_id, count) VALUES (?, 1) \
             ON CONFLICT(book_id) DO UPDATE SET count = count + 1",
        )
        .bind(book_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmaker_core::BookDraft;
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn adapter() -> SqliteAdapter {
        // Every in-memory connection is its own database, so pin the pool to one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let adapter = SqliteAdapter::new(pool);
        adapter.run_migrations().await.unwrap();
        adapter
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn draft(title: &str, finished: Option<&str>) -> BookDraft {
        BookDraft {
            title: title.into(),
            author: "Le Guin".into(),
            finished_at: finished.map(|d| CalendarDate::parse(d).unwrap()),
            rating: Some(4),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn books_round_trip_through_the_table() {
        let db = adapter().await;
        let created = db
            .create_book(Book::from_draft(draft("Earthsea", Some("2024-02-29")), now()))
            .await
            .unwrap();

        let fetched = db.get_book(created.id).await.unwrap();
        assert_eq!(fetched, created);

        let mut changed = fetched.clone();
        changed.finished_at = None;
        changed.rating = None;
        db.update_book(changed).await.unwrap();
        let fetched = db.get_book(created.id).await.unwrap();
        assert_eq!(fetched.finished_at, None);
        assert_eq!(fetched.rating, None);

        assert_eq!(db.list_books().await.unwrap().len(), 1);
        db.delete_book(created.id).await.unwrap();
        assert!(matches!(db.get_book(created.id).await, Err(PortError::NotFound(_))));
        assert!(matches!(db.delete_book(created.id).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn updating_a_missing_book_is_not_found() {
        let db = adapter().await;
        let ghost = Book::from_draft(draft("Ghost", None), now());
        assert!(matches!(db.update_book(ghost).await, Err(PortError::NotFound(_))));
    }

    #[tokio::test]
    async fn recording_unlocks_keeps_the_first_timestamp() {
        let db = adapter().await;
        let first = UnlockEntry {
            id: "first_read".into(),
            acquired_at: now(),
        };
        db.record_unlocks(&[first.clone()]).await.unwrap();

        let later = now() + chrono::Duration::days(3);
        db.record_unlocks(&[
            UnlockEntry {
                id: "first_read".into(),
                acquired_at: later,
            },
            UnlockEntry {
                id: "streak_3".into(),
                acquired_at: later,
            },
        ])
        .await
        .unwrap();

        let stored = db.list_unlocks().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], first);
        assert_eq!(stored[1].id, "streak_3");
    }

    #[tokio::test]
    async fn counters_accumulate() {
        let db = adapter().await;
        assert_eq!(db.load_counters().await.unwrap(), ActionCounters::default());

        db.bump_action("searchCount").await.unwrap();
        db.bump_action("searchCount").await.unwrap();
        db.bump_action("exportCount").await.unwrap();
        let book = Uuid::new_v4();
        for _ in 0..3 {
            db.bump_edit(book).await.unwrap();
        }

        let counters = db.load_counters().await.unwrap();
        assert_eq!(counters.get("searchCount"), 2);
        assert_eq!(counters.get("exportCount"), 1);
        assert_eq!(counters.edit_counts.get(&book), Some(&3));
    }
}
