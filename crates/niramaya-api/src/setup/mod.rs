//! Application setup and initialization
//!
//! This module contains the initialization logic used by main.rs, kept separate so
//! integration tests can build the same router.

pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::{AppState, UploadState};
use anyhow::{Context, Result};
use niramaya_core::{Config, UuidTokens};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    niramaya_infra::init_telemetry("niramaya-api", config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let storage = storage::setup_storage(&config).await?;

    let state = Arc::new(AppState {
        upload: UploadState::from_config(&config, storage, Arc::new(UuidTokens)),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
