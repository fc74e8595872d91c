//! Application state shared by the handlers.

use crate::services::upload::UploadLimits;
use niramaya_core::{Config, NameTokenSource, TypePolicy};
use niramaya_storage::StorageSink;
use std::sync::Arc;

/// Everything the upload pipeline needs for one request
#[derive(Clone)]
pub struct UploadState {
    pub storage: Arc<dyn StorageSink>,
    pub policy: TypePolicy,
    pub limits: UploadLimits,
    pub names: Arc<dyn NameTokenSource>,
}

impl UploadState {
    /// Limits and allowlists taken from configuration
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn StorageSink>,
        names: Arc<dyn NameTokenSource>,
    ) -> Self {
        Self {
            storage,
            policy: TypePolicy::new(
                config.allowed_extensions().to_vec(),
                config.allowed_content_types().to_vec(),
            ),
            limits: UploadLimits {
                max_part_size_bytes: config.max_part_size_bytes(),
                max_parts: config.max_parts(),
            },
            names,
        }
    }
}

pub struct AppState {
    pub upload: UploadState,
}
