use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::InvalidationStore;

/// In-process invalidation store for tests and single-node deployments
#[derive(Default)]
pub struct MemoryInvalidationStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryInvalidationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live invalidation records
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl InvalidationStore for MemoryInvalidationStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
