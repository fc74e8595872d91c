//! Niramaya Core Library
//!
//! This crate provides the configuration, error types, filename sanitization and
//! type validation shared by the Niramaya crates.

pub mod config;
pub mod error;
pub mod naming;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, Config, UploadServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use naming::{sanitize_filename, NameTokenSource, SanitizedName, UuidTokens};
pub use validation::{TypePolicy, ValidationError};
