//! Storage setup and initialization

use anyhow::Result;
use niramaya_core::Config;
use niramaya_storage::{LocalStorage, StorageSink};
use std::sync::Arc;

/// Create the local storage sink rooted at `UPLOAD_DIR`.
///
/// The root is provisioned eagerly, but a failure here is only logged: every upload
/// provisions again and reports the failure to its client.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn StorageSink>> {
    let storage = LocalStorage::unprovisioned(config.upload_dir());

    match storage.provision().await {
        Ok(()) => tracing::info!(
            upload_dir = %storage.base_path().display(),
            "Local storage initialized"
        ),
        Err(e) => tracing::warn!(
            error = %e,
            upload_dir = %storage.base_path().display(),
            "Upload directory not available yet"
        ),
    }

    Ok(Arc::new(storage))
}
