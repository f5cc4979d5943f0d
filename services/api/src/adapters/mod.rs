pub mod catalog;
pub mod db;

pub use catalog::FileCatalogSource;
pub use db::SqliteAdapter;
