//! Storage and naming doubles for fault injection.

use async_trait::async_trait;
use niramaya_core::NameTokenSource;
use niramaya_storage::{
    LocalStorage, StorageError, StorageResult, StorageSink, WriteDestination,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Predictable tokens: t1, t2, ...
#[derive(Default)]
pub struct SequentialTokens(AtomicUsize);

impl NameTokenSource for SequentialTokens {
    fn next_token(&self) -> String {
        format!("t{}", self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

/// Local storage whose writes fail for destinations with the given extension
pub struct FlakyStorage {
    pub inner: LocalStorage,
    pub failing_extension: &'static str,
}

struct BrokenDestination {
    inner: Box<dyn WriteDestination>,
}

#[async_trait]
impl WriteDestination for BrokenDestination {
    fn location(&self) -> &str {
        self.inner.location()
    }

    async fn write(&mut self, _bytes: &[u8]) -> StorageResult<()> {
        Err(StorageError::WriteFailed("No space left on device".to_string()))
    }

    async fn finalize(self: Box<Self>) -> StorageResult<u64> {
        self.inner.finalize().await
    }
}

#[async_trait]
impl StorageSink for FlakyStorage {
    async fn provision(&self) -> StorageResult<()> {
        self.inner.provision().await
    }

    async fn create_destination(
        &self,
        unique_name: &str,
    ) -> StorageResult<Box<dyn WriteDestination>> {
        let inner = self.inner.create_destination(unique_name).await?;
        if unique_name.ends_with(self.failing_extension) {
            Ok(Box::new(BrokenDestination { inner }))
        } else {
            Ok(inner)
        }
    }

    async fn delete(&self, location: &str) -> StorageResult<()> {
        self.inner.delete(location).await
    }

    async fn exists(&self, location: &str) -> StorageResult<bool> {
        self.inner.exists(location).await
    }
}
