#[cfg(test)]
#[path = "persistent_store_test.rs"]
mod tests;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::models::HistoryExport;
use crate::domain::models::StorageBox;
use crate::domain::models::StorageKey;

/// Typed JSON layer over a storage backend. Failures never reach the caller:
/// they are logged and the default, or the previous state, wins.
pub struct PersistentStore {
    backend: StorageBox,
}

impl PersistentStore {
    pub fn new(backend: StorageBox) -> PersistentStore {
        return PersistentStore { backend };
    }

    pub async fn load<T: DeserializeOwned>(&self, key: StorageKey, default: T) -> T {
        let payload = match self.backend.read(key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return default,
            Err(err) => {
                tracing::warn!(key = %key, error = ?err, "Failed to read stored value");
                return default;
            }
        };

        match serde_json::from_str::<T>(&payload) {
            Ok(val) => return val,
            Err(err) => {
                tracing::warn!(key = %key, error = ?err, "Stored value is corrupt, using default");
                return default;
            }
        }
    }

    pub async fn save<T: Serialize + ?Sized>(&self, key: StorageKey, value: &T) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(key = %key, error = ?err, "Failed to serialize value for storage");
                return;
            }
        };

        if let Err(err) = self.backend.write(key, &payload).await {
            tracing::warn!(key = %key, error = ?err, "Failed to write stored value");
        }
    }

    pub async fn remove(&self, key: StorageKey) {
        if let Err(err) = self.backend.remove(key).await {
            tracing::warn!(key = %key, error = ?err, "Failed to remove stored value");
        }
    }

    /// Re-hydrates the conversation keys from an exported document.
    pub async fn restore(&self, export: &HistoryExport) {
        self.save(StorageKey::Messages, &export.messages).await;
        self.save(StorageKey::Role, &export.role).await;
    }
}
