pub mod protocol;
pub mod rest;
pub mod state;

// Re-export the handlers to make them easily accessible
// to the binary that will build the web server router.
pub use rest::{
    action_handler, create_book_handler, delete_book_handler, health_handler,
    invalidate_catalog_handler, list_achievements_handler, list_books_handler,
    reload_catalog_handler, stats_handler, update_book_handler,
};
