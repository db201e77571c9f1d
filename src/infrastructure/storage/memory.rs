use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::models::StorageBackend;
use crate::domain::models::StorageKey;

/// Non durable storage, used for `--ephemeral` sessions and tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<StorageKey, String>,
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    #[allow(clippy::implicit_return)]
    async fn read(&self, key: StorageKey) -> Result<Option<String>> {
        return Ok(self.entries.get(&key).map(|val| {
            return val.to_string();
        }));
    }

    #[allow(clippy::implicit_return)]
    async fn write(&self, key: StorageKey, value: &str) -> Result<()> {
        self.entries.insert(key, value.to_string());
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn remove(&self, key: StorageKey) -> Result<()> {
        self.entries.remove(&key);
        return Ok(());
    }
}
