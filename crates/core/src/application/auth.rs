// Request Authentication - bearer token to authorized identity

use std::sync::Arc;

use crate::domain::Identity;
use crate::error::{AppError, Result};
use crate::port::UserDirectory;
use crate::token::TokenCodec;

const BEARER_PREFIX: &str = "Bearer ";

/// Turns an `Authorization` header into an authenticated [`Identity`].
///
/// The request walks `TokenExtracted -> ClaimVerified -> UserResolved`;
/// any failed step short-circuits into an authentication error. A missing
/// user is reported the same way as a bad token so callers cannot probe
/// which user ids exist.
pub struct Authenticator {
    codec: TokenCodec,
    users: Arc<dyn UserDirectory>,
}

impl Authenticator {
    pub fn new(codec: TokenCodec, users: Arc<dyn UserDirectory>) -> Self {
        Self { codec, users }
    }

    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<Identity> {
        let header = authorization
            .ok_or_else(|| AppError::Authentication("missing authorization header".to_string()))?;

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::Authentication("malformed authorization header".to_string())
            })?;

        let identity: Identity = self.codec.unseal(token).map_err(|err| {
            tracing::debug!(error = %err, "token rejected");
            AppError::Authentication(err.to_string())
        })?;

        // Confirm the referenced user still exists before trusting the claim.
        // Upstream failures propagate as-is and become internal-service errors.
        let user = self.users.find_user(&identity.id).await?;
        if user.is_none() {
            return Err(AppError::Authentication(format!(
                "user {} not found",
                identity.id
            )));
        }

        Ok(identity)
    }
}
