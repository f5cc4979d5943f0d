//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Every handler that records a user action bumps the matching counter and then
//! runs one evaluation pass, returning whatever that pass unlocked. Once the action
//! itself is accepted, neither a counter write nor the pass can fail the request.
//! Both are logged, and a failed pass is reported through `passFailed`.

use crate::error::ApiError;
use crate::web::protocol::{
    AchievementView, ActionKind, BookListResponse, BookResponse, BookView, CreateBookRequest,
    PassResponse, ReloadResponse, SearchQuery, StatsResponse, UnlockedView, UpdateBookRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use bookmaker_core::domain::{counter_names, Book, EventKind, LastEvent};
use bookmaker_core::ports::PortError;
use bookmaker_core::{CalendarDate, EvaluationContext, ReadingStats};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::OpenApi;
use uuid::Uuid;

/// Saves completed within this many seconds count as a fast entry.
pub const FAST_ENTRY_SECONDS: u64 = 60;

type HandlerError = (StatusCode, String);

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_books_handler,
        create_book_handler,
        update_book_handler,
        delete_book_handler,
        action_handler,
        list_achievements_handler,
        reload_catalog_handler,
        invalidate_catalog_handler,
        stats_handler,
    ),
    components(
        schemas(
            CreateBookRequest,
            UpdateBookRequest,
            ActionKind,
            BookView,
            UnlockedView,
            BookResponse,
            BookListResponse,
            PassResponse,
            AchievementView,
            ReloadResponse,
            StatsResponse,
        )
    ),
    tags(
        (name = "Bookmaker API", description = "Reading log with rule-driven achievements.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Helpers
//=========================================================================================

/// Maps a port failure onto an HTTP status, logging the underlying error.
fn port_failure(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Invalid(msg) => {
            error!("{}: {}", context, msg);
            (StatusCode::UNPROCESSABLE_ENTITY, msg)
        }
        PortError::Unexpected(msg) => {
            error!("{}: {}", context, msg);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

async fn bump(state: &AppState, name: &str) {
    if let Err(e) = state.counters.bump_action(name).await {
        error!("Failed to bump action counter {}: {}", name, e);
    }
}

async fn bump_edit(state: &AppState, id: Uuid) {
    if let Err(e) = state.counters.bump_edit(id).await {
        error!("Failed to bump edit counter for book {}: {}", id, e);
    }
}

/// What one evaluation pass reported back to the handler.
#[derive(Debug, Default)]
struct PassOutcome {
    newly_unlocked: Vec<UnlockedView>,
    failed: bool,
}

/// Runs one evaluation pass for `event`.
///
/// The action that triggered the pass has already been stored, so a failed pass
/// is logged and flagged instead of failing the request; the next pass picks up
/// whatever is due.
async fn run_pass(state: &AppState, event: LastEvent) -> PassOutcome {
    let result = async {
        let books = state.books.list_books().await?;
        let counters = state.counters.load_counters().await?;
        let newly = state
            .engine
            .evaluate_and_unlock(&books, &counters, Some(&event), Utc::now())
            .await?;
        Ok::<_, ApiError>(newly)
    }
    .await;

    match result {
        Ok(newly) => PassOutcome {
            newly_unlocked: newly.into_iter().map(UnlockedView::from).collect(),
            failed: false,
        },
        Err(e) => {
            error!("Achievement pass after {:?} failed: {}", event.kind, e);
            PassOutcome {
                newly_unlocked: Vec::new(),
                failed: true,
            }
        }
    }
}

fn matches_query(book: &Book, needle: &str) -> bool {
    [&book.title, &book.author, &book.review_text, &book.one_liner]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The service is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}

/// List book records, optionally filtered by a search query.
///
/// A non-empty `q` counts as a search action and runs a `search` pass.
#[utoipa::path(
    get,
    path = "/books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books", body = BookListResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_books_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<BookListResponse>, HandlerError> {
    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut pass = PassOutcome::default();
    if needle.is_some() {
        bump(&app_state, counter_names::SEARCH).await;
        pass = run_pass(&app_state, LastEvent::new(EventKind::Search)).await;
    }

    let mut books = app_state
        .books
        .list_books()
        .await
        .map_err(|e| port_failure("Failed to list books", e))?;
    if let Some(needle) = &needle {
        books.retain(|b| matches_query(b, needle));
        debug!("Search {:?} matched {} books.", needle, books.len());
    }

    Ok(Json(BookListResponse {
        books: books.iter().map(BookView::from).collect(),
        newly_unlocked: pass.newly_unlocked,
        pass_failed: pass.failed,
    }))
}

/// Create a book record and run a `save` pass.
#[utoipa::path(
    post,
    path = "/books",
    request_body = CreateBookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Malformed date or rating"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_book_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), HandlerError> {
    let duration_sec = payload.duration_sec;
    let draft = payload
        .into_draft()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;

    let book = app_state
        .books
        .create_book(Book::from_draft(draft, Utc::now()))
        .await
        .map_err(|e| port_failure("Failed to create book", e))?;

    let rated = book.rating().is_some();
    if rated {
        bump(&app_state, counter_names::RATE).await;
    }
    if duration_sec.is_some_and(|secs| secs <= FAST_ENTRY_SECONDS) {
        bump(&app_state, counter_names::FAST_CREATE).await;
    }

    let mut event = LastEvent::with_book(EventKind::Save, book.clone()).with_rating_set(rated);
    event.duration_sec = duration_sec;
    let pass = run_pass(&app_state, event).await;

    Ok((
        StatusCode::CREATED,
        Json(BookResponse {
            book: BookView::from(&book),
            newly_unlocked: pass.newly_unlocked,
            pass_failed: pass.failed,
        }),
    ))
}

/// Apply a partial update to a book record and run an `edit` pass.
#[utoipa::path(
    put,
    path = "/books/{id}",
    request_body = UpdateBookRequest,
    params(("id" = Uuid, Path, description = "The book id.")),
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Malformed date or rating"),
        (status = 404, description = "No such book"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn update_book_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBookRequest>,
) -> Result<Json<BookResponse>, HandlerError> {
    let patch = payload
        .into_patch()
        .map_err(|msg| (StatusCode::BAD_REQUEST, msg))?;
    let rated = matches!(patch.rating, Some(Some(_)));

    let mut book = app_state
        .books
        .get_book(id)
        .await
        .map_err(|e| port_failure("Failed to load book", e))?;
    book.apply(patch, Utc::now());
    let book = app_state
        .books
        .update_book(book)
        .await
        .map_err(|e| port_failure("Failed to update book", e))?;

    bump_edit(&app_state, id).await;
    if rated {
        bump(&app_state, counter_names::RATE).await;
    }

    let event = LastEvent::with_book(EventKind::Edit, book.clone()).with_rating_set(rated);
    let pass = run_pass(&app_state, event).await;
    Ok(Json(BookResponse {
        book: BookView::from(&book),
        newly_unlocked: pass.newly_unlocked,
        pass_failed: pass.failed,
    }))
}

/// Delete a book record and run a `delete` pass.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    params(("id" = Uuid, Path, description = "The book id.")),
    responses(
        (status = 200, description = "Book deleted", body = PassResponse),
        (status = 404, description = "No such book"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn delete_book_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<PassResponse>, HandlerError> {
    let book = app_state
        .books
        .get_book(id)
        .await
        .map_err(|e| port_failure("Failed to load book", e))?;
    app_state
        .books
        .delete_book(id)
        .await
        .map_err(|e| port_failure("Failed to delete book", e))?;
    bump(&app_state, counter_names::DELETE).await;

    let pass = run_pass(&app_state, LastEvent::with_book(EventKind::Delete, book)).await;
    Ok(Json(PassResponse {
        newly_unlocked: pass.newly_unlocked,
        pass_failed: pass.failed,
    }))
}

/// Record a backup, restore or settings action and run the matching pass.
#[utoipa::path(
    post,
    path = "/actions/{kind}",
    params(("kind" = ActionKind, Path, description = "backup, restore or settings")),
    responses(
        (status = 200, description = "Action recorded", body = PassResponse)
    )
)]
pub async fn action_handler(
    State(app_state): State<Arc<AppState>>,
    Path(kind): Path<ActionKind>,
) -> Json<PassResponse> {
    let event = kind.event();
    if let Some(name) = event.counter_key() {
        bump(&app_state, name).await;
    }
    let pass = run_pass(&app_state, LastEvent::new(event)).await;
    Json(PassResponse {
        newly_unlocked: pass.newly_unlocked,
        pass_failed: pass.failed,
    })
}

/// The achievement catalog in catalog order, with unlock state.
#[utoipa::path(
    get,
    path = "/achievements",
    responses(
        (status = 200, description = "Catalog with unlock state", body = [AchievementView]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_achievements_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<AchievementView>>, HandlerError> {
    let catalog = app_state
        .engine
        .catalog()
        .await
        .map_err(|e| port_failure("Failed to load achievement catalog", e))?;
    let unlocks = app_state
        .engine
        .unlocks()
        .await
        .map_err(|e| port_failure("Failed to load unlock state", e))?;
    let by_id: HashMap<&str, _> = unlocks.iter().map(|u| (u.id.as_str(), u)).collect();

    Ok(Json(
        catalog
            .iter()
            .map(|def| AchievementView::new(def, by_id.get(def.id.as_str()).copied()))
            .collect(),
    ))
}

/// Re-read the catalog file. On failure the previously loaded catalog stays active.
#[utoipa::path(
    post,
    path = "/achievements/reload",
    responses(
        (status = 200, description = "Catalog reloaded", body = ReloadResponse),
        (status = 500, description = "The catalog could not be read")
    )
)]
pub async fn reload_catalog_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, HandlerError> {
    match app_state.engine.reload_catalog().await {
        Ok(catalog) => Ok(Json(ReloadResponse {
            definitions: catalog.len(),
        })),
        Err(e) => {
            error!("Failed to reload achievement catalog: {:?}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Drop the cached catalog. The next request that needs it reads the file again.
#[utoipa::path(
    delete,
    path = "/achievements/cache",
    responses((status = 204, description = "Catalog cache cleared"))
)]
pub async fn invalidate_catalog_handler(State(app_state): State<Arc<AppState>>) -> StatusCode {
    app_state.engine.invalidate_catalog().await;
    StatusCode::NO_CONTENT
}

/// Reading statistics derived from the finished books.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Reading statistics", body = StatsResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, HandlerError> {
    let books = app_state
        .books
        .list_books()
        .await
        .map_err(|e| port_failure("Failed to list books", e))?;
    let ctx = EvaluationContext::build(&books, CalendarDate::today(Utc::now()));
    Ok(Json(StatsResponse {
        stats: ReadingStats::from_context(&ctx),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::SqliteAdapter;
    use async_trait::async_trait;
    use bookmaker_core::domain::{AchievementDefinition, ActionCounters};
    use bookmaker_core::ports::{CatalogSource, CounterStore, PortResult};
    use bookmaker_core::AchievementEngine;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    struct StaticCatalog;

    #[async_trait]
    impl CatalogSource for StaticCatalog {
        async fn load_catalog(&self) -> PortResult<Vec<AchievementDefinition>> {
            serde_json::from_value(json!([
                {"id": "first_read", "name": "First Page", "rule": {"type": "TOTAL_READS", "gte": 1}},
                {"id": "searcher", "name": "Seeker", "rule": {"type": "USER_ACTION", "event": "searchCount"}},
                {"id": "archivist", "name": "Archivist", "rule": {"type": "USER_ACTION", "event": "exportCount"}},
                {"id": "critic", "name": "Critic", "rule": {"type": "RATING_SET"}},
                {"id": "speedy", "name": "Speedy", "rule": {"type": "FAST_ENTRY", "lteSec": 30}},
                {"id": "tinkerer", "name": "Tinkerer", "rule": {"type": "EDIT_SAME_BOOK_GTE", "gte": 2}}
            ]))
            .map_err(|e| PortError::Invalid(e.to_string()))
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl CatalogSource for BrokenCatalog {
        async fn load_catalog(&self) -> PortResult<Vec<AchievementDefinition>> {
            Err(PortError::Unexpected("catalog unavailable".into()))
        }
    }

    /// Reads succeed but every counter write fails.
    struct ReadOnlyCounters;

    #[async_trait]
    impl CounterStore for ReadOnlyCounters {
        async fn load_counters(&self) -> PortResult<ActionCounters> {
            Ok(ActionCounters::default())
        }

        async fn bump_action(&self, _name: &str) -> PortResult<()> {
            Err(PortError::Unexpected("counter table is locked".into()))
        }

        async fn bump_edit(&self, _book_id: Uuid) -> PortResult<()> {
            Err(PortError::Unexpected("counter table is locked".into()))
        }
    }

    async fn database() -> Arc<SqliteAdapter> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let db = Arc::new(SqliteAdapter::new(pool));
        db.run_migrations().await.unwrap();
        db
    }

    async fn state() -> Arc<AppState> {
        let db = database().await;
        Arc::new(AppState {
            books: db.clone(),
            counters: db.clone(),
            engine: Arc::new(AchievementEngine::new(Arc::new(StaticCatalog), db)),
        })
    }

    fn ids(views: &[UnlockedView]) -> Vec<&str> {
        views.iter().map(|v| v.id.as_str()).collect()
    }

    async fn create(state: &Arc<AppState>, payload: CreateBookRequest) -> BookResponse {
        let (status, Json(body)) = create_book_handler(State(state.clone()), Json(payload))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn creating_books_reports_each_unlock_once() {
        let state = state().await;
        let body = create(
            &state,
            CreateBookRequest {
                title: "  Kindred ".into(),
                author: "Butler".into(),
                finished_at: "2024-03-01".into(),
                rating: Some(5),
                duration_sec: Some(20),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(body.book.title, "Kindred");
        assert_eq!(ids(&body.newly_unlocked), vec!["first_read", "critic", "speedy"]);

        let body = create(
            &state,
            CreateBookRequest {
                title: "Dawn".into(),
                finished_at: "2024-03-02".into(),
                ..Default::default()
            },
        )
        .await;
        assert!(body.newly_unlocked.is_empty());

        let counters = state.counters.load_counters().await.unwrap();
        assert_eq!(counters.get(counter_names::RATE), 1);
        assert_eq!(counters.get(counter_names::FAST_CREATE), 1);
    }

    #[tokio::test]
    async fn searching_bumps_the_counter_and_filters() {
        let state = state().await;
        create(
            &state,
            CreateBookRequest {
                title: "Parable of the Sower".into(),
                ..Default::default()
            },
        )
        .await;
        create(
            &state,
            CreateBookRequest {
                title: "Lilith's Brood".into(),
                ..Default::default()
            },
        )
        .await;

        let Json(all) = list_books_handler(State(state.clone()), Query(SearchQuery::default()))
            .await
            .unwrap();
        assert_eq!(all.books.len(), 2);
        assert!(all.newly_unlocked.is_empty());

        let Json(found) = list_books_handler(
            State(state.clone()),
            Query(SearchQuery {
                q: Some("SOWER".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(found.books.len(), 1);
        assert_eq!(ids(&found.newly_unlocked), vec!["searcher"]);
        assert_eq!(
            state.counters.load_counters().await.unwrap().get(counter_names::SEARCH),
            1
        );
    }

    #[tokio::test]
    async fn edits_are_counted_per_book() {
        let state = state().await;
        let created = create(&state, CreateBookRequest::default()).await;
        let id = created.book.id;

        let Json(first) = update_book_handler(
            State(state.clone()),
            Path(id),
            Json(UpdateBookRequest {
                one_liner: Some("Quietly devastating.".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(first.book.one_liner, "Quietly devastating.");
        assert!(first.newly_unlocked.is_empty());

        let Json(second) = update_book_handler(
            State(state.clone()),
            Path(id),
            Json(UpdateBookRequest {
                finished_at: Some("2024-04-01".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(second.book.finished_at, "2024-04-01");
        assert_eq!(ids(&second.newly_unlocked), vec!["first_read", "tinkerer"]);
    }

    #[tokio::test]
    async fn missing_books_and_bad_input_are_client_errors() {
        let state = state().await;
        let err = update_book_handler(
            State(state.clone()),
            Path(Uuid::new_v4()),
            Json(UpdateBookRequest::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = delete_book_handler(State(state.clone()), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = create_book_handler(
            State(state.clone()),
            Json(CreateBookRequest {
                rating: Some(9),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn actions_and_catalog_view_reflect_unlock_state() {
        let state = state().await;
        let Json(pass) = action_handler(State(state.clone()), Path(ActionKind::Backup)).await;
        assert_eq!(ids(&pass.newly_unlocked), vec!["archivist"]);

        let Json(views) = list_achievements_handler(State(state.clone())).await.unwrap();
        assert_eq!(views.len(), 6);
        let archivist = views.iter().find(|v| v.id == "archivist").unwrap();
        assert!(archivist.unlocked && archivist.acquired_at.is_some());
        assert_eq!(archivist.rule_type.as_deref(), Some("USER_ACTION"));
        assert!(!views.iter().find(|v| v.id == "first_read").unwrap().unlocked);

        let Json(reloaded) = reload_catalog_handler(State(state.clone())).await.unwrap();
        assert_eq!(reloaded.definitions, 6);
    }

    #[tokio::test]
    async fn stats_summarise_finished_books() {
        let state = state().await;
        for (title, author, finished) in [("A", "Ann", "2024-01-01"), ("B", "Bo", "2024-01-02"), ("C", "Ann", "")] {
            create(
                &state,
                CreateBookRequest {
                    title: title.into(),
                    author: author.into(),
                    finished_at: finished.into(),
                    ..Default::default()
                },
            )
            .await;
        }

        let Json(body) = stats_handler(State(state)).await.unwrap();
        assert_eq!(body.stats.total_reads, 2);
        assert_eq!(body.stats.unique_authors, 2);
        assert_eq!(body.stats.streak.max, 2);
        assert_eq!(body.stats.by_month.get("2024-01"), Some(&2));
    }

    #[tokio::test]
    async fn counter_failures_keep_the_stored_mutation_successful() {
        let db = database().await;
        let state = Arc::new(AppState {
            books: db.clone(),
            counters: Arc::new(ReadOnlyCounters),
            engine: Arc::new(AchievementEngine::new(Arc::new(StaticCatalog), db)),
        });

        let body = create(
            &state,
            CreateBookRequest {
                title: "Kindred".into(),
                finished_at: "2024-03-01".into(),
                rating: Some(5),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(ids(&body.newly_unlocked), vec!["first_read", "critic"]);
        assert!(!body.pass_failed);
        assert_eq!(state.books.list_books().await.unwrap().len(), 1);

        let Json(updated) = update_book_handler(
            State(state.clone()),
            Path(body.book.id),
            Json(UpdateBookRequest {
                rating: Some(3),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(updated.book.rating, Some(3));

        let Json(deleted) = delete_book_handler(State(state.clone()), Path(body.book.id))
            .await
            .unwrap();
        assert!(!deleted.pass_failed);
        assert!(state.books.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_passes_are_flagged_in_the_response() {
        let db = database().await;
        let state = Arc::new(AppState {
            books: db.clone(),
            counters: db.clone(),
            engine: Arc::new(AchievementEngine::new(Arc::new(BrokenCatalog), db)),
        });

        let body = create(
            &state,
            CreateBookRequest {
                title: "Kindred".into(),
                finished_at: "2024-03-01".into(),
                ..Default::default()
            },
        )
        .await;
        assert!(body.pass_failed);
        assert!(body.newly_unlocked.is_empty());
        assert_eq!(state.books.list_books().await.unwrap().len(), 1);

        let Json(pass) = action_handler(State(state.clone()), Path(ActionKind::Settings)).await;
        assert!(pass.pass_failed);

        let Json(listed) = list_books_handler(State(state.clone()), Query(SearchQuery::default()))
            .await
            .unwrap();
        assert!(!listed.pass_failed);
    }

    #[tokio::test]
    async fn only_edits_that_set_a_rating_count_as_rating() {
        let state = state().await;
        let created = create(&state, CreateBookRequest::default()).await;
        assert!(created.newly_unlocked.is_empty());

        let Json(untouched) = update_book_handler(
            State(state.clone()),
            Path(created.book.id),
            Json(UpdateBookRequest {
                title: Some("Wild Seed".into()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert!(untouched.newly_unlocked.is_empty());

        let Json(rated) = update_book_handler(
            State(state.clone()),
            Path(created.book.id),
            Json(UpdateBookRequest {
                rating: Some(4),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(ids(&rated.newly_unlocked), vec!["critic", "tinkerer"]);
    }

    #[tokio::test]
    async fn clearing_the_catalog_cache_keeps_the_catalog_available() {
        let state = state().await;
        assert_eq!(
            invalidate_catalog_handler(State(state.clone())).await,
            StatusCode::NO_CONTENT
        );
        let Json(views) = list_achievements_handler(State(state.clone())).await.unwrap();
        assert_eq!(views.len(), 6);
    }
}
