//! Request/Response Types
//!
//! Raw request bodies (validated in `validate`) and the one response
//! envelope every route answers with.

use std::collections::BTreeMap;

use axum::Json;
use serde::{Deserialize, Serialize};

/// `{"status": "success", "data": ...}`
#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<T> {
    pub status: &'static str,
    pub data: T,
}

pub fn success<T: Serialize>(data: T) -> Json<SuccessEnvelope<T>> {
    Json(SuccessEnvelope {
        status: "success",
        data,
    })
}

/// `{"status": "error", "error": {"code", "message", "fields"?}}`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

impl ErrorEnvelope {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: ErrorBody {
                code,
                message: message.into(),
                fields: None,
            },
        }
    }

    pub fn with_fields(
        code: &'static str,
        message: impl Into<String>,
        fields: BTreeMap<String, String>,
    ) -> Self {
        Self {
            status: "error",
            error: ErrorBody {
                code,
                message: message.into(),
                fields: Some(fields),
            },
        }
    }
}

/// POST /tasks/ body, as received. Unknown fields (like a client-supplied
/// `user_id`) are dropped here and never reach the service.
#[derive(Debug, Default, Deserialize)]
pub struct CreateTaskBody {
    pub description: Option<String>,
    pub state: Option<String>,
}

/// PATCH /tasks/{id} body, as received
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskBody {
    pub description: Option<String>,
}
