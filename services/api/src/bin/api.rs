//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{FileCatalogSource, SqliteAdapter},
    config::Config,
    error::ApiError,
    web::{
        action_handler, create_book_handler, delete_book_handler, health_handler,
        invalidate_catalog_handler, list_achievements_handler, list_books_handler,
        reload_catalog_handler, state::AppState, stats_handler, update_book_handler,
    },
};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use bookmaker_core::AchievementEngine;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(SqliteAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Load the Achievement Catalog ---
    let catalog_source = Arc::new(FileCatalogSource::new(config.catalog_path.clone()));
    let engine = Arc::new(AchievementEngine::new(catalog_source, db_adapter.clone()));
    match engine.catalog().await {
        Ok(catalog) => info!(
            "Loaded {} achievement definitions from {}",
            catalog.len(),
            config.catalog_path.display()
        ),
        // Passes retry the load; books can still be recorded meanwhile.
        Err(e) => warn!("Achievement catalog unavailable at startup: {}", e),
    }

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        books: db_adapter.clone(),
        counters: db_adapter,
        engine,
    });

    // --- 5. Configure CORS ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 6. Create the Web Router ---
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route("/books/{id}", put(update_book_handler).delete(delete_book_handler))
        .route("/actions/{kind}", post(action_handler))
        .route("/achievements", get(list_achievements_handler))
        .route("/achievements/reload", post(reload_catalog_handler))
        .route("/achievements/cache", delete(invalidate_catalog_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .with_state(app_state);

    // --- 7. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
