//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use niramaya_core::Config;

/// Size above which a single part is almost certainly a misconfiguration
const LARGE_PART_WARNING_BYTES: u64 = 1024 * 1024 * 1024;

/// Validate critical configuration values
///
/// Hard errors come from [`Config::validate`]; this adds startup warnings for values
/// that are legal but suspicious.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();
    if config.is_production() && env_var.is_none() {
        tracing::warn!("Production mode detected but ENVIRONMENT/APP_ENV not set");
    }

    if config.max_part_size_bytes() > LARGE_PART_WARNING_BYTES {
        tracing::warn!(
            max_part_size_bytes = config.max_part_size_bytes(),
            "MAX_FILE_SIZE_MB is above 1 GiB"
        );
    }

    if config.upload_dir().is_relative() {
        tracing::warn!(
            upload_dir = %config.upload_dir().display(),
            "UPLOAD_DIR is relative and resolves against the working directory"
        );
    }

    Ok(())
}
