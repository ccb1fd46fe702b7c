//! Boundary Validation
//!
//! Turns raw request bodies into service requests, collecting a field-error
//! map so clients see every problem at once. Nothing malformed reaches the
//! business logic.

use std::collections::BTreeMap;

use taskbox_core::application::task::{CreateTask, UpdateTask};
use taskbox_core::domain::TaskState;
use uuid::Uuid;

use crate::error::ApiError;

const DESCRIPTION_REQUIRED: &str = "description is required and must not be empty";
const STATE_INVALID: &str = "state must be one of: todo, done";
const ID_INVALID: &str = "id must be a valid UUID";

fn required_description(raw: Option<&str>, errors: &mut BTreeMap<String, String>) -> Option<String> {
    match raw.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Some(trimmed.to_string()),
        _ => {
            errors.insert("description".to_string(), DESCRIPTION_REQUIRED.to_string());
            None
        }
    }
}

pub fn create_task(body: &crate::types::CreateTaskBody) -> Result<CreateTask, ApiError> {
    let mut errors = BTreeMap::new();

    let description = required_description(body.description.as_deref(), &mut errors);

    let state = match body.state.as_deref() {
        None => None,
        Some("todo") => Some(TaskState::Todo),
        Some("done") => Some(TaskState::Done),
        Some(_) => {
            errors.insert("state".to_string(), STATE_INVALID.to_string());
            None
        }
    };

    match (description, errors.is_empty()) {
        (Some(description), true) => Ok(CreateTask { description, state }),
        _ => Err(ApiError::validation(errors)),
    }
}

pub fn update_task(body: &crate::types::UpdateTaskBody) -> Result<UpdateTask, ApiError> {
    let mut errors = BTreeMap::new();
    let description = required_description(body.description.as_deref(), &mut errors);

    match (description, errors.is_empty()) {
        (Some(description), true) => Ok(UpdateTask { description }),
        _ => Err(ApiError::validation(errors)),
    }
}

pub fn task_id(id: &str) -> Result<(), ApiError> {
    if Uuid::parse_str(id).is_err() {
        let mut errors = BTreeMap::new();
        errors.insert("id".to_string(), ID_INVALID.to_string());
        return Err(ApiError::validation(errors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreateTaskBody, UpdateTaskBody};

    #[test]
    fn test_create_task_happy_path() {
        let body = CreateTaskBody {
            description: Some("  buy milk  ".to_string()),
            state: Some("done".to_string()),
        };
        let request = create_task(&body).unwrap();
        assert_eq!(request.description, "buy milk");
        assert_eq!(request.state, Some(TaskState::Done));
    }

    #[test]
    fn test_create_task_defaults_state() {
        let body = CreateTaskBody {
            description: Some("buy milk".to_string()),
            state: None,
        };
        assert_eq!(create_task(&body).unwrap().state, None);
    }

    #[test]
    fn test_create_task_collects_all_field_errors() {
        let body = CreateTaskBody {
            description: Some("   ".to_string()),
            state: Some("archived".to_string()),
        };
        let err = create_task(&body).unwrap_err();
        let ApiError::Validation(fields) = err else {
            panic!("expected validation error");
        };
        assert!(fields.contains_key("description"));
        assert!(fields.contains_key("state"));
    }

    #[test]
    fn test_create_task_missing_description() {
        let err = create_task(&CreateTaskBody::default()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_update_task_requires_description() {
        let err = update_task(&UpdateTaskBody::default()).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let request = update_task(&UpdateTaskBody {
            description: Some("new text".to_string()),
        })
        .unwrap();
        assert_eq!(request.description, "new text");
    }

    #[test]
    fn test_task_id_must_be_uuid() {
        assert!(task_id("5bd9f1f7-6e7a-4a6f-9d3a-52a2a2b3f111").is_ok());
        assert!(task_id("doc-1").is_err());
        assert!(task_id("").is_err());
    }
}
