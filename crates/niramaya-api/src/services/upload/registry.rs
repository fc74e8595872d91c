//! Request-scoped upload session
//!
//! One [`UploadSession`] exists per request. It owns the accepted-file registry, the
//! request failure flag, the abort signal seen by every ingestor and the latch that
//! lets exactly one outcome be decided. Cleanup only runs from [`UploadSession::conclude`]
//! (for failed outcomes) and from tasks that settle after an abort.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use niramaya_storage::StorageSink;
use tokio::sync::{Mutex, OnceCell};
use tokio_util::sync::CancellationToken;

use super::types::{AcceptedFile, UploadOutcome};

pub struct UploadSession {
    storage: Arc<dyn StorageSink>,
    accepted: Mutex<Vec<AcceptedFile>>,
    has_error: AtomicBool,
    aborted: AtomicBool,
    abort: CancellationToken,
    decided: OnceCell<UploadOutcome>,
}

impl UploadSession {
    pub fn new(storage: Arc<dyn StorageSink>) -> Arc<Self> {
        Arc::new(Self {
            storage,
            accepted: Mutex::new(Vec::new()),
            has_error: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            abort: CancellationToken::new(),
            decided: OnceCell::new(),
        })
    }

    pub fn flag_error(&self) {
        self.has_error.store(true, Ordering::SeqCst);
    }

    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }

    /// Signal observed by ingestors; fires when the request is rolled back.
    pub fn abort_signal(&self) -> CancellationToken {
        self.abort.clone()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub fn is_decided(&self) -> bool {
        self.decided.initialized()
    }

    /// Track a file that now exists in storage
    pub async fn register(&self, file: AcceptedFile) {
        self.accepted.lock().await.push(file);
    }

    pub async fn accepted_count(&self) -> usize {
        self.accepted.lock().await.len()
    }

    pub async fn accepted_files(&self) -> Vec<AcceptedFile> {
        self.accepted.lock().await.clone()
    }

    /// Decide the request's outcome.
    ///
    /// The first call wins. A failed outcome aborts in-flight ingestors and deletes
    /// every registered file before this returns. Later calls return the already
    /// decided outcome and do nothing else.
    pub async fn conclude(&self, outcome: UploadOutcome) -> UploadOutcome {
        self.decided
            .get_or_init(|| async move {
                if !outcome.is_success() {
                    self.mark_aborted();
                    self.cleanup().await;
                }
                outcome
            })
            .await
            .clone()
    }

    /// Deferred cleanup for a task that settles after the request was rolled back
    pub async fn settle(&self, location: &str) {
        if !self.is_aborted() {
            return;
        }
        if let Err(e) = self.storage.delete(location).await {
            tracing::error!(error = %e, location, "Failed to delete file after abort");
        } else {
            tracing::debug!(location, "Deleted file written after abort");
        }
    }

    /// Roll back a request whose handler went away before deciding an outcome
    pub fn abandon(self: &Arc<Self>) {
        if self.is_decided() || self.is_aborted() {
            return;
        }
        self.mark_aborted();
        tracing::warn!("Upload abandoned before completion, cleaning up");

        let session = Arc::clone(self);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    session.cleanup().await;
                });
            }
            Err(_) => tracing::error!("No runtime available to clean up abandoned upload"),
        }
    }

    fn mark_aborted(&self) {
        self.aborted.store(true, Ordering::SeqCst);
        self.abort.cancel();
    }

    /// Delete every registered file. Failures are logged and never change the outcome.
    async fn cleanup(&self) {
        let files = self.accepted_files().await;
        let mut deleted = 0;
        for file in &files {
            match self.storage.delete(&file.location).await {
                Ok(()) => {
                    deleted += 1;
                    tracing::debug!(location = %file.location, "Cleaned up file");
                }
                Err(e) => {
                    tracing::error!(error = %e, location = %file.location, "Failed to clean up file");
                }
            }
        }
        tracing::info!(registered = files.len(), deleted, "Rolled back upload");
    }
}

/// Rolls the session back if dropped before an outcome was decided
pub struct SessionGuard(Arc<UploadSession>);

impl SessionGuard {
    pub fn new(session: Arc<UploadSession>) -> Self {
        Self(session)
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.0.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::upload::types::UploadFailure;
    use niramaya_storage::LocalStorage;
    use tempfile::tempdir;

    async fn stored(storage: &LocalStorage, name: &str) -> AcceptedFile {
        let dest = storage.create_destination(name).await.unwrap();
        dest.finalize().await.unwrap();
        AcceptedFile {
            field_name: "file".to_string(),
            generated_name: name.to_string(),
            location: name.to_string(),
        }
    }

    fn success() -> UploadOutcome {
        UploadOutcome {
            accepted_count: 1,
            failed_count: 0,
            limit_breached: false,
            error_detail: None,
        }
    }

    #[tokio::test]
    async fn test_success_keeps_files() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let session = UploadSession::new(storage.clone());
        session.register(stored(&storage, "a-1.png").await).await;

        let outcome = session.conclude(success()).await;
        assert!(outcome.is_success());
        assert!(!session.is_aborted());
        assert!(storage.exists("a-1.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_failure_deletes_every_registered_file() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let session = UploadSession::new(storage.clone());
        session.register(stored(&storage, "a-1.png").await).await;
        session.register(stored(&storage, "b-2.pdf").await).await;
        let signal = session.abort_signal();

        let outcome = session
            .conclude(UploadOutcome::failed(UploadFailure::LimitExceeded("x".into())))
            .await;

        assert!(!outcome.is_success());
        assert!(signal.is_cancelled());
        assert!(!storage.exists("a-1.png").await.unwrap());
        assert!(!storage.exists("b-2.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_first_decision_wins() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let session = UploadSession::new(storage.clone());
        session.register(stored(&storage, "a-1.png").await).await;

        let first = session.conclude(success()).await;
        let late = session
            .conclude(UploadOutcome::failed(UploadFailure::LimitExceeded("late".into())))
            .await;

        assert_eq!(first, late);
        assert!(late.is_success());
        assert!(!session.is_aborted());
        assert!(storage.exists("a-1.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_settle_only_deletes_after_abort() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let session = UploadSession::new(storage.clone());

        stored(&storage, "late-1.png").await;
        session.settle("late-1.png").await;
        assert!(storage.exists("late-1.png").await.unwrap());

        session
            .conclude(UploadOutcome::failed(UploadFailure::ParserFailed("x".into())))
            .await;
        session.settle("late-1.png").await;
        assert!(!storage.exists("late-1.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_dropped_guard_rolls_back_undecided_session() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let session = UploadSession::new(storage.clone());
        session.register(stored(&storage, "a-1.png").await).await;

        drop(SessionGuard::new(session.clone()));
        assert!(session.is_aborted());

        for _ in 0..50 {
            if !storage.exists("a-1.png").await.unwrap() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(!storage.exists("a-1.png").await.unwrap());
    }
}
