//! Route Table
//!
//! Versioned task routes behind the authorization middleware, plus the
//! health check and the envelope-shaped 404 fallback.

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::authenticate;
use crate::state::AppState;

/// Build the API router. `api_prefix` is the versioned root path the task
/// routes live under (e.g. `/api/v1`).
pub fn create_router(state: AppState, api_prefix: &str) -> Router {
    let tasks = Router::new()
        .route("/", post(handlers::create_task).get(handlers::list_tasks))
        .route(
            "/{id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/{id}/done", patch(handlers::mark_done))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate,
        ));

    let prefix = normalize_prefix(api_prefix);

    Router::new()
        .route("/", get(handlers::health))
        .nest(&format!("{prefix}/tasks"), tasks)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Leading slash, no trailing slash; an empty prefix mounts at the root.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
