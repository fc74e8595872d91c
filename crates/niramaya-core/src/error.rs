//! Error types module
//!
//! `AppError` is the single error type the HTTP layer renders. Every variant maps to
//! a fixed client message so internal paths and causes never reach a response body;
//! the detailed message is only logged.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Warning level - for client-caused failures like rejected parts or limit breaches
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code used in logs (e.g., "UPLOAD_REJECTED")
    fn error_code(&self) -> &'static str;

    /// Client-facing message; never contains internal detail
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// At least one part was rejected or failed to persist; the request was rolled back.
    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    /// A part exceeded the per-part byte cap or the request exceeded the part-count cap.
    #[error("Limit exceeded: {0}")]
    PayloadTooLarge(String),

    /// The multipart stream could not be parsed or was interrupted.
    #[error("Multipart stream failed: {0}")]
    UploadFailed(String),

    /// The storage root could not be prepared.
    #[error("Storage provisioning failed: {0}")]
    StorageProvisioning(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (http_status, error_code, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, LogLevel) {
    match err {
        AppError::UploadRejected(_) => (500, "UPLOAD_REJECTED", LogLevel::Warn),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", LogLevel::Warn),
        AppError::UploadFailed(_) => (500, "UPLOAD_FAILED", LogLevel::Warn),
        AppError::StorageProvisioning(_) => (500, "STORAGE_PROVISIONING_ERROR", LogLevel::Error),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for logs
    pub fn error_type(&self) -> &str {
        match self {
            AppError::UploadRejected(_) => "UploadRejected",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::UploadFailed(_) => "UploadFailed",
            AppError::StorageProvisioning(_) => "StorageProvisioning",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            AppError::UploadRejected(_) => "Some files failed to upload".to_string(),
            AppError::PayloadTooLarge(_) => "File size limit exceeded".to_string(),
            AppError::UploadFailed(_) => "File upload failed".to_string(),
            AppError::StorageProvisioning(_) => "Failed to create upload directory".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Unexpected error during upload".to_string()
            }
        }
    }
}
