// Authenticated Identity

use serde::{Deserialize, Serialize};

use crate::domain::task::UserId;

/// The principal derived from unsealing a bearer token.
///
/// `id` references a user in the external user directory; the rest of the
/// claim payload is carried opaquely so callers keep whatever the token
/// issuer put there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,

    #[serde(flatten)]
    pub claims: serde_json::Map<String, serde_json::Value>,
}

impl Identity {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            claims: serde_json::Map::new(),
        }
    }
}
