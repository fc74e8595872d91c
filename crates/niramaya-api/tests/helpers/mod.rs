//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p niramaya-api --test upload_test`.

pub mod fixtures;
pub mod storage;

use axum_test::TestServer;
use niramaya_api::setup::routes;
use niramaya_api::state::{AppState, UploadState};
use niramaya_core::{Config, NameTokenSource, UploadServiceConfig};
use niramaya_storage::{LocalStorage, StorageSink};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub use storage::{FlakyStorage, SequentialTokens};

/// Test application: server plus the temporary upload root it writes to.
pub struct TestApp {
    pub server: TestServer,
    pub upload_dir: PathBuf,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Sorted names of every file in the upload root (empty if it does not exist)
    pub fn stored_files(&self) -> Vec<String> {
        list_files(&self.upload_dir)
    }

    /// Wait for detached writes to finish cleaning up after a short-circuited request
    pub async fn wait_for_empty_upload_dir(&self) -> Vec<String> {
        for _ in 0..100 {
            let files = self.stored_files();
            if files.is_empty() {
                return files;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.stored_files()
    }
}

pub fn list_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| {
            entry
                .expect("Failed to read directory entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}

/// Setup test app with default limits, local storage and predictable name tokens.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

/// Setup test app after adjusting the default configuration.
pub async fn setup_test_app_with(configure: impl FnOnce(&mut UploadServiceConfig)) -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let mut inner = UploadServiceConfig::with_upload_dir(temp_dir.path().join("uploads"));
    configure(&mut inner);
    let config = Config(Box::new(inner));

    let storage: Arc<dyn StorageSink> = Arc::new(LocalStorage::unprovisioned(config.upload_dir()));
    build_app(config, storage, Arc::new(SequentialTokens::default()), temp_dir)
}

/// Setup test app over a caller-provided storage sink rooted in `temp_dir/uploads`.
pub fn setup_test_app_with_storage(
    storage: Arc<dyn StorageSink>,
    names: Arc<dyn NameTokenSource>,
    temp_dir: TempDir,
) -> TestApp {
    let config = Config(Box::new(UploadServiceConfig::with_upload_dir(
        temp_dir.path().join("uploads"),
    )));
    build_app(config, storage, names, temp_dir)
}

fn build_app(
    config: Config,
    storage: Arc<dyn StorageSink>,
    names: Arc<dyn NameTokenSource>,
    temp_dir: TempDir,
) -> TestApp {
    let upload_dir = config.upload_dir().to_path_buf();
    let state = Arc::new(AppState {
        upload: UploadState::from_config(&config, storage, names),
    });

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        upload_dir,
        _temp_dir: temp_dir,
    }
}
