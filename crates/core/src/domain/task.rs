// Task Domain Model

use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};
use crate::port::document_repository::Document;

/// Task ID (UUID v4, assigned by the repository at creation)
pub type TaskId = String;

/// Owning user identifier (set once at creation, never client-supplied)
pub type UserId = String;

/// Task State
///
/// Only one transition is exposed: `todo -> done`. There is no way back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    #[default]
    Todo,
    Done,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Todo => write!(f, "todo"),
            TaskState::Done => write!(f, "done"),
        }
    }
}

/// Task Entity
///
/// Timestamps are epoch milliseconds, maintained by the repository layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    #[serde(default)]
    pub state: TaskState,
    pub user_id: UserId,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    /// Ownership check against an authenticated principal's id
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Completed tasks are immutable for description edits
    pub fn is_editable(&self) -> bool {
        self.state != TaskState::Done
    }
}

impl Document for Task {
    const COLLECTION: &'static str = "tasks";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Normalize and validate a task description: trimmed, non-empty.
pub fn validate_description(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}
