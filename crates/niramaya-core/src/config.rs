//! Configuration module
//!
//! Environment-driven configuration for the upload service: server settings, the
//! storage root, per-request limits and the type allowlists.

use std::env;
use std::path::PathBuf;

// Common constants
const SERVER_PORT: u16 = 3000;
const MAX_FILE_SIZE_MB: u64 = 10;
const MAX_UPLOAD_PARTS: usize = 20;
const UPLOAD_DIR: &str = "uploads";

/// Extensions accepted when `ALLOWED_EXTENSIONS` is not set.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".pdf"];

/// Media types accepted when `ALLOWED_CONTENT_TYPES` is not set.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "application/pdf"];

/// Server settings shared by every entry point
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct UploadServiceConfig {
    pub base: BaseConfig,
    /// Root directory accepted files are written to
    pub upload_dir: PathBuf,
    /// Byte cap for a single part; exceeding it mid-stream is a limit breach
    pub max_part_size_bytes: u64,
    /// Maximum number of parts in one request
    pub max_parts: usize,
    /// Lowercased extensions including the leading dot
    pub allowed_extensions: Vec<String>,
    /// Lowercased media types without parameters
    pub allowed_content_types: Vec<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<UploadServiceConfig>);

impl Config {
    fn as_upload(&self) -> &UploadServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.as_upload().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = UploadServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_upload().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_upload().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_upload().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_upload().base.environment
    }

    pub fn upload_dir(&self) -> &std::path::Path {
        &self.as_upload().upload_dir
    }

    pub fn max_part_size_bytes(&self) -> u64 {
        self.as_upload().max_part_size_bytes
    }

    pub fn max_parts(&self) -> usize {
        self.as_upload().max_parts
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.as_upload().allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_upload().allowed_content_types
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extensions may be configured with or without the leading dot.
fn normalize_extension(ext: String) -> String {
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

impl UploadServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<u64>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .map(|raw| parse_list(&raw))
            .unwrap_or_else(|_| {
                DEFAULT_ALLOWED_EXTENSIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .into_iter()
            .map(normalize_extension)
            .collect();

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .map(|raw| parse_list(&raw))
            .unwrap_or_else(|_| {
                DEFAULT_ALLOWED_CONTENT_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
        };

        let config = UploadServiceConfig {
            base,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(UPLOAD_DIR)),
            max_part_size_bytes: max_file_size_mb * 1024 * 1024,
            max_parts: env::var("MAX_UPLOAD_PARTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_UPLOAD_PARTS),
            allowed_extensions,
            allowed_content_types,
        };

        config.validate()?;

        Ok(config)
    }

    /// Configuration with the built-in defaults rooted at `upload_dir`.
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        UploadServiceConfig {
            base: BaseConfig {
                server_port: SERVER_PORT,
                cors_origins: vec!["*".to_string()],
                environment: "development".to_string(),
            },
            upload_dir: upload_dir.into(),
            max_part_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            max_parts: MAX_UPLOAD_PARTS,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let environment = self.base.environment.to_lowercase();
        let is_production = environment == "production" || environment == "prod";
        if is_production && self.base.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_part_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.max_parts == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_PARTS must be greater than 0"));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS cannot be empty"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES cannot be empty"));
        }

        if self.upload_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("UPLOAD_DIR cannot be empty"));
        }

        Ok(())
    }
}
