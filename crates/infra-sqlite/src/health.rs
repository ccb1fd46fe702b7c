// Store readiness probe

use async_trait::async_trait;
use sqlx::SqlitePool;
use taskbox_core::error::{AppError, Result};
use taskbox_core::port::StoreHealth;

pub struct SqliteStoreHealth {
    pool: SqlitePool,
}

impl SqliteStoreHealth {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreHealth for SqliteStoreHealth {
    async fn ready(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
