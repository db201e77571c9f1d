#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::domain::models::StorageBackend;
use crate::domain::models::StorageKey;

/// Stores every key as its own `<key>.json` file inside a directory.
pub struct FileStorage {
    pub dir: path::PathBuf,
}

impl FileStorage {
    pub fn new(dir: path::PathBuf) -> FileStorage {
        return FileStorage { dir };
    }

    fn get_file_path(&self, key: StorageKey) -> path::PathBuf {
        return self.dir.join(format!("{key}.json"));
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    #[allow(clippy::implicit_return)]
    async fn read(&self, key: StorageKey) -> Result<Option<String>> {
        let file_path = self.get_file_path(key);
        if !file_path.exists() {
            return Ok(None);
        }

        let payload = fs::read_to_string(file_path).await?;
        return Ok(Some(payload));
    }

    #[allow(clippy::implicit_return)]
    async fn write(&self, key: StorageKey, value: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
        }

        // Write to a sibling and rename so readers never observe a partial file.
        let file_path = self.get_file_path(key);
        let tmp_path = self.dir.join(format!(".{key}.json.tmp"));
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(value.as_bytes()).await?;
        file.flush().await?;
        drop(file);
        fs::rename(tmp_path, file_path).await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn remove(&self, key: StorageKey) -> Result<()> {
        let file_path = self.get_file_path(key);
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path).await?;
        return Ok(());
    }
}
