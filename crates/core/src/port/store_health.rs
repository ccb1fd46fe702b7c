// Store Health Port (readiness probe for the backing document store)

use async_trait::async_trait;

use crate::error::Result;

/// Readiness check used by the health endpoint.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// `Ok(())` when the store connection can serve requests.
    async fn ready(&self) -> Result<()>;
}
