// HTTP User Directory - resolves acting users against the user service

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use taskbox_core::error::{AppError, Result};
use taskbox_core::port::{UserDirectory, UserRecord};
use tracing::warn;

/// Bounded wait for the user service before the lookup counts as failed
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

const LOOKUP_FAILED: &str = "We could not complete this request, please try again";

pub struct HttpUserDirectory {
    base_url: String,
    client: reqwest::Client,
}

impl HttpUserDirectory {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("user directory client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn user_url(&self, id: &str) -> String {
        format!("{}/user/{}", self.base_url, id)
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    /// Any transport-level failure (timeout, connection, unexpected status)
    /// is translated into one uniform upstream error; only a clean 404 means
    /// the user does not exist.
    async fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let url = self.user_url(id);
        let response = self.client.get(&url).send().await.map_err(|err| {
            warn!(url = %url, error = %err, "user lookup failed");
            AppError::Upstream(LOOKUP_FAILED.to_string())
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let user = response.json::<UserRecord>().await.map_err(|err| {
                    warn!(url = %url, error = %err, "user lookup returned malformed body");
                    AppError::Upstream(LOOKUP_FAILED.to_string())
                })?;
                Ok(Some(user))
            }
            status => {
                warn!(url = %url, status = %status, "user lookup returned unexpected status");
                Err(AppError::Upstream(LOOKUP_FAILED.to_string()))
            }
        }
    }
}
