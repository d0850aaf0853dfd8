use std::path::PathBuf;
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use super::{validate_key, Storage, StorageError, StorageResult};

/// A file-based storage implementation.
///
/// Each key maps to one file under `base_path`. Writes go to a sibling
/// temporary file first and are renamed into place, so a crash mid-save
/// leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
    sync_writes: bool,
}

impl FileStorage {
    /// Create a new file storage instance, creating `base_path` if needed
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = base_path.into();

        if fs::metadata(&path).await.is_err() {
            fs::create_dir_all(&path).await?;
        }

        Ok(Self {
            base_path: path,
            sync_writes: true,
        })
    }

    /// Skip fsync on write (tests and throwaway stores)
    pub fn without_sync(mut self) -> Self {
        self.sync_writes = false;
        self
    }

    fn get_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.base_path.clone(), |path, part| path.join(part)))
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.get_path(key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp_path = path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(data).await?;
        if self.sync_writes {
            file.sync_all().await?;
        }
        drop(file);

        fs::rename(&tmp_path, &path).await?;

        debug!("Stored {} bytes at key: {}", data.len(), key);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.get_path(key)?;

        match fs::read(&path).await {
            Ok(data) => {
                trace!("Retrieved data for key: {}", key);
                Ok(data)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::KeyNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
