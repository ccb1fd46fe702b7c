// Audit Records

use serde::Serialize;

/// A single audit trail entry for a user-initiated activity.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub activity: String,
    pub message: String,
    pub object_id: String,
    pub ip_address: Option<String>,
}

impl AuditRecord {
    pub fn new(
        activity: impl Into<String>,
        message: impl Into<String>,
        object_id: impl Into<String>,
    ) -> Self {
        Self {
            activity: activity.into(),
            message: message.into(),
            object_id: object_id.into(),
            ip_address: None,
        }
    }

    pub fn with_ip(mut self, ip_address: Option<String>) -> Self {
        self.ip_address = ip_address;
        self
    }
}

/// Emit an audit record as a structured tracing event under the `audit` target.
pub fn record(entry: &AuditRecord) {
    tracing::info!(
        target: "audit",
        activity = %entry.activity,
        object_id = %entry.object_id,
        ip_address = entry.ip_address.as_deref().unwrap_or("-"),
        "{}",
        entry.message
    );
}
