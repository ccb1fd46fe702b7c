// Port Layer - Interfaces for external dependencies

pub mod document_repository;
pub mod event_bus;
pub mod id_provider; // For deterministic testing
pub mod store_health;
pub mod time_provider;
pub mod user_directory;

// Re-exports
pub use document_repository::{Condition, Document, DocumentRepository, Query};
pub use event_bus::{Delivery, EventBus, EventHandler, PublishOptions, SubscribeOptions};
pub use id_provider::IdProvider;
pub use store_health::StoreHealth;
pub use time_provider::TimeProvider;
pub use user_directory::{UserDirectory, UserRecord};
