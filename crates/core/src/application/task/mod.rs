// Task Service - ownership and state-transition rules over the task collection


use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::task::{self, Task, TaskState};
use crate::domain::Identity;
use crate::error::{AppError, Result};
use crate::port::{Condition, DocumentRepository, EventBus, PublishOptions, Query};

/// Queue that task lifecycle events are published to
pub const TASK_EVENTS_QUEUE: &str = "task.events";

/// Creation request, validated at the HTTP boundary before it gets here.
/// Note the absence of `user_id`: ownership always comes from the requester.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub description: String,

    #[serde(default)]
    pub state: Option<TaskState>,
}

/// Update request; only the description is updatable through this path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTask {
    pub description: String,
}

/// Enforces the business invariants on every task operation:
/// the requester owns the task, and completed tasks stay immutable.
pub struct TaskService {
    tasks: Arc<dyn DocumentRepository<Task>>,
    events: Arc<dyn EventBus>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn DocumentRepository<Task>>, events: Arc<dyn EventBus>) -> Self {
        Self { tasks, events }
    }

    /// Create a task owned by the requester.
    ///
    /// `user_id` is forced to the requester's id regardless of anything the
    /// client supplied.
    pub async fn create_task(&self, requester: &Identity, request: CreateTask) -> Result<Task> {
        let description = task::validate_description(&request.description)?;
        let state = request.state.unwrap_or_default();

        let created = self
            .tasks
            .create(json!({
                "description": description,
                "state": state,
                "user_id": requester.id,
            }))
            .await?;

        self.publish_event("task.created", &created).await;
        Ok(created)
    }

    pub async fn get_task(&self, requester: &Identity, id: &str) -> Result<Task> {
        let task = self.tasks.by_id(id).await?;
        ensure_owner(&task, requester)?;
        Ok(task)
    }

    /// Tasks owned by the requester, oldest first.
    pub async fn list_tasks(&self, requester: &Identity) -> Result<Vec<Task>> {
        let query = Query::new()
            .filter("user_id", Condition::Eq(json!(requester.id)))
            .sort("+created_at");
        self.tasks.all(query).await
    }

    /// Update a task's description. Completed tasks are immutable and the
    /// attempt is reported as a state conflict.
    pub async fn update_task(
        &self,
        requester: &Identity,
        id: &str,
        request: UpdateTask,
    ) -> Result<Task> {
        let task = self.tasks.by_id(id).await?;
        ensure_owner(&task, requester)?;
        if !task.is_editable() {
            return Err(AppError::Conflict(
                "You can not edit a completed task".to_string(),
            ));
        }

        let description = task::validate_description(&request.description)?;
        self.tasks
            .atomic_update(id, json!({ "description": description }))
            .await
    }

    /// Transition a task to done. Idempotent: marking a done task done again
    /// succeeds and changes nothing.
    pub async fn mark_done(&self, requester: &Identity, id: &str) -> Result<Task> {
        let task = self.tasks.by_id(id).await?;
        ensure_owner(&task, requester)?;

        let already_done = task.state == TaskState::Done;
        let updated = self
            .tasks
            .atomic_update(id, json!({ "state": TaskState::Done }))
            .await?;

        if !already_done {
            self.publish_event("task.completed", &updated).await;
        }
        Ok(updated)
    }

    /// Permanently remove a task, in any state. Returns the deleted record.
    pub async fn delete_task(&self, requester: &Identity, id: &str) -> Result<Task> {
        let task = self.tasks.by_id(id).await?;
        ensure_owner(&task, requester)?;

        let deleted = self.tasks.destroy(id).await?;
        self.publish_event("task.deleted", &deleted).await;
        Ok(deleted)
    }

    /// Publish a lifecycle event; a broken bus must not fail the request.
    async fn publish_event(&self, event: &str, task: &Task) {
        let payload = json!({ "event": event, "task": task });
        if let Err(err) = self
            .events
            .publish(TASK_EVENTS_QUEUE, payload, PublishOptions::default())
            .await
        {
            tracing::warn!(event = %event, task_id = %task.id, error = %err, "event publish failed");
        }
    }
}

/// Ownership checks complete (and pass) before any mutation is issued.
fn ensure_owner(task: &Task, requester: &Identity) -> Result<()> {
    if !task.is_owned_by(&requester.id) {
        return Err(AppError::Authorization("You are not authorised".to_string()));
    }
    Ok(())
}
