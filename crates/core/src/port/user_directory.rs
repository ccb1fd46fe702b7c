// User Directory Port (remote lookup of the acting user)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A user as the external directory service reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

/// Remote user lookup.
///
/// `Ok(None)` means the user does not exist; transport failures, timeouts and
/// unexpected statuses surface as `AppError::Upstream`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashSet;

    /// Directory backed by a fixed set of known user ids
    #[derive(Default)]
    pub struct StaticUserDirectory {
        users: HashSet<String>,
    }

    impl StaticUserDirectory {
        pub fn with_users(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
            Self {
                users: ids.into_iter().map(Into::into).collect(),
            }
        }
    }

    #[async_trait]
    impl UserDirectory for StaticUserDirectory {
        async fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
            Ok(self.users.get(id).map(|known| UserRecord {
                id: known.clone(),
                email: None,
                name: None,
            }))
        }
    }
}
