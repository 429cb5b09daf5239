use anyhow::{Result, anyhow};
use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::InvalidationStore;

/// Redis-backed invalidation store.
///
/// Uses a [`ConnectionManager`], which multiplexes and reconnects on its own;
/// cloning it per call is cheap. Timeouts and retries are the connection
/// manager's business, not ours.
pub struct RedisInvalidationStore {
    manager: ConnectionManager,
}

impl RedisInvalidationStore {
    /// Connects to the given redis URL
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let client = redis::Client::open(url.as_ref())
            .map_err(|err| anyhow!("failed to open redis client: {err}"))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|err| anyhow!("failed to establish redis connection: {err}"))?;
        Ok(Self { manager })
    }

    /// Wraps an already established connection manager
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl InvalidationStore for RedisInvalidationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key)
            .await
            .map_err(|err| anyhow!("failed to read invalidation key: {err}"))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .set(key, value)
            .await
            .map_err(|err| anyhow!("failed to write invalidation key: {err}"))?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .del(key)
            .await
            .map_err(|err| anyhow!("failed to delete invalidation key: {err}"))?;
        Ok(())
    }
}
