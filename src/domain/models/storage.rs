use anyhow::Result;
use async_trait::async_trait;

/// Keys of the values the widget keeps between visits. Each key is stored and
/// fails independently of the others.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum StorageKey {
    #[strum(serialize = "chatMessages")]
    Messages,
    #[strum(serialize = "userRole")]
    Role,
    #[strum(serialize = "chatSettings")]
    Settings,
}

/// Raw string key-value storage, swappable for any durable store.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn read(&self, key: StorageKey) -> Result<Option<String>>;
    async fn write(&self, key: StorageKey, value: &str) -> Result<()>;
    async fn remove(&self, key: StorageKey) -> Result<()>;
}

pub type StorageBox = Box<dyn StorageBackend>;
