//! HTTP API Layer
//!
//! Versioned JSON surface over the task service: route table, request
//! validation, bearer-token middleware and the response envelopes.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;
pub mod validate;

pub use router::create_router;
pub use state::AppState;
