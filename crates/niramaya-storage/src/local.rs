use crate::traits::{StorageError, StorageResult, StorageSink, WriteDestination};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Local filesystem storage implementation
///
/// Objects are flat files directly under `base_path`; keys are single path
/// components generated by the upload pipeline.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating the root directory if needed
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/niramaya/uploads")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let storage = Self::unprovisioned(base_path);
        storage.provision().await?;
        Ok(storage)
    }

    /// Create an instance without touching the filesystem; the root is created by
    /// [`StorageSink::provision`] on first use.
    pub fn unprovisioned(base_path: impl Into<PathBuf>) -> Self {
        LocalStorage {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Keys must be exactly one normal path component so nothing can escape the
    /// storage root.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains('\0') || storage_key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let mut components = Path::new(storage_key).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.base_path.join(storage_key)),
            _ => Err(StorageError::InvalidKey(
                "Storage key must be a single file name".to_string(),
            )),
        }
    }
}

/// Destination backed by a newly created file
struct LocalDestination {
    writer: BufWriter<fs::File>,
    path: PathBuf,
    location: String,
    bytes_written: u64,
    started: Instant,
}

#[async_trait]
impl WriteDestination for LocalDestination {
    fn location(&self) -> &str {
        &self.location
    }

    async fn write(&mut self, bytes: &[u8]) -> StorageResult<()> {
        self.writer.write_all(bytes).await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to write file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    async fn finalize(mut self: Box<Self>) -> StorageResult<u64> {
        self.writer.flush().await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to flush file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        self.writer.get_ref().sync_all().await.map_err(|e| {
            StorageError::WriteFailed(format!(
                "Failed to sync file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %self.path.display(),
            key = %self.location,
            size_bytes = self.bytes_written,
            duration_ms = self.started.elapsed().as_secs_f64() * 1000.0,
            "Local storage write successful"
        );

        Ok(self.bytes_written)
    }
}

#[async_trait]
impl StorageSink for LocalStorage {
    async fn provision(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                self.base_path.display(),
                e
            ))
        })
    }

    async fn create_destination(
        &self,
        unique_name: &str,
    ) -> StorageResult<Box<dyn WriteDestination>> {
        let path = self.key_to_path(unique_name)?;

        // create_new: a generated name that already exists is a collision, never an overwrite
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| {
                StorageError::WriteFailed(format!(
                    "Failed to create file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        tracing::debug!(path = %path.display(), key = %unique_name, "Local storage destination created");

        Ok(Box::new(LocalDestination {
            writer: BufWriter::new(file),
            path,
            location: unique_name.to_string(),
            bytes_written: 0,
            started: Instant::now(),
        }))
    }

    async fn delete(&self, location: &str) -> StorageResult<()> {
        let path = self.key_to_path(location)?;
        let start = Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %location,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, location: &str) -> StorageResult<bool> {
        let path = self.key_to_path(location)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }
}
