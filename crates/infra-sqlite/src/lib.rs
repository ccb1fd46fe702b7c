// Taskbox Infrastructure - SQLite Adapter
// Implements: DocumentRepository (generic document store), StoreHealth

mod connection;
mod document_repository;
mod health;
mod migration;

pub use connection::create_pool;
pub use document_repository::SqliteDocumentRepository;
pub use health::SqliteStoreHealth;
pub use migration::run_migrations;

// Note: sqlx::Error conversion is handled by a local mapper
// (orphan rules forbid implementing From<sqlx::Error> for AppError here)
