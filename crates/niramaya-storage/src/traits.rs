//! Storage sink abstraction
//!
//! This module defines the traits every storage backend implements: a sink that
//! hands out write destinations for generated names and deletes stored objects.

use async_trait::async_trait;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An open destination receiving one object's bytes.
///
/// A destination exists in storage from the moment it is created; callers that give
/// up on it must delete its [`location`](WriteDestination::location) through the sink.
#[async_trait]
pub trait WriteDestination: Send {
    /// Storage key of the object being written
    fn location(&self) -> &str;

    /// Append bytes to the object
    async fn write(&mut self, bytes: &[u8]) -> StorageResult<()>;

    /// Flush and make the object durable. Returns the number of bytes written.
    async fn finalize(self: Box<Self>) -> StorageResult<u64>;
}

/// Storage sink trait
///
/// The upload pipeline only needs to open destinations for names it generated and
/// to delete them again during rollback.
#[async_trait]
pub trait StorageSink: Send + Sync {
    /// Prepare the storage root (create directories, check access).
    async fn provision(&self) -> StorageResult<()>;

    /// Create a destination for a unique object name
    async fn create_destination(&self, unique_name: &str)
        -> StorageResult<Box<dyn WriteDestination>>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, location: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, location: &str) -> StorageResult<bool>;
}
