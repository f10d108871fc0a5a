//! SQLite persistence.

pub mod database;
pub mod repository;
pub mod schema;

pub use database::Database;
pub use repository::Repository;
