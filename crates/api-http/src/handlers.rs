//! Route Handlers
//!
//! Thin glue: validate the request, call the task service, wrap the result
//! in the response envelope.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use taskbox_core::domain::audit::{self, AuditRecord};
use taskbox_core::domain::Task;

use crate::error::{code, ApiError};
use crate::middleware::{ApiJson, CurrentUser};
use crate::state::AppState;
use crate::types::{success, CreateTaskBody, ErrorEnvelope, UpdateTaskBody};
use crate::validate;

type HandlerResult = Result<Json<crate::types::SuccessEnvelope<Task>>, ApiError>;

/// POST /tasks/
pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<CreateTaskBody>,
) -> HandlerResult {
    let request = validate::create_task(&body)?;
    let task = state.tasks.create_task(&user, request).await?;

    audit::record(
        &AuditRecord::new("create.task", "New task created", &task.id)
            .with_ip(client_ip(&headers)),
    );
    Ok(success(task))
}

/// GET /tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> HandlerResult {
    validate::task_id(&id)?;
    let task = state.tasks.get_task(&user, &id).await?;
    Ok(success(task))
}

/// GET /tasks/
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<crate::types::SuccessEnvelope<Vec<Task>>>, ApiError> {
    let tasks = state.tasks.list_tasks(&user).await?;
    Ok(success(tasks))
}

/// PATCH /tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateTaskBody>,
) -> HandlerResult {
    validate::task_id(&id)?;
    let request = validate::update_task(&body)?;
    let task = state.tasks.update_task(&user, &id, request).await?;
    Ok(success(task))
}

/// PATCH /tasks/{id}/done
pub async fn mark_done(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> HandlerResult {
    validate::task_id(&id)?;
    let task = state.tasks.mark_done(&user, &id).await?;
    Ok(success(task))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> HandlerResult {
    validate::task_id(&id)?;
    let task = state.tasks.delete_task(&user, &id).await?;
    Ok(success(task))
}

/// GET / - health check; 200 with a welcome payload while the store
/// connection is ready, 500 otherwise
pub async fn health(State(state): State<AppState>) -> Response {
    match state.store_health.ready().await {
        Ok(()) => success(serde_json::json!({
            "message": format!("Welcome to {}", state.service_name)
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "store connection is not ready");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorEnvelope::new(
                    code::INTERNAL_ERROR,
                    "Store connection is not ready",
                )),
            )
                .into_response()
        }
    }
}

/// Fallback for unmatched routes
pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorEnvelope::new(code::NOT_FOUND, "Not Found")),
    )
        .into_response()
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|ip| ip.trim().to_string())
}
