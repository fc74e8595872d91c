//! Types used by the upload pipeline

use niramaya_core::AppError;
use niramaya_storage::StorageError;

use super::parser::ParserFault;

/// Per-request caps enforced while the multipart stream is read
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Byte cap for a single part
    pub max_part_size_bytes: u64,
    /// Maximum number of file parts in one request
    pub max_parts: usize,
}

/// A part that passed validation and has a destination in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedFile {
    /// Multipart field the part arrived under
    pub field_name: String,
    /// `{base}-{token}{ext}`
    pub generated_name: String,
    /// Storage key of the destination
    pub location: String,
}

/// Terminal state of one part's copy into storage
#[derive(Debug)]
pub enum IngestOutcome {
    Completed { bytes: u64 },
    /// The part's byte stream failed or the request was aborted mid-copy
    SourceError(String),
    WriteError(StorageError),
}

impl IngestOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, IngestOutcome::Completed { .. })
    }
}

/// Why a request was rolled back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadFailure {
    /// One or more parts were rejected or failed to persist
    Rejected(String),
    /// Per-part byte cap or part-count cap breached
    LimitExceeded(String),
    /// Malformed or interrupted multipart stream
    ParserFailed(String),
    /// The storage root could not be prepared
    Provisioning(String),
    /// A part task ended without reporting an outcome
    Unexpected(String),
}

impl From<ParserFault> for UploadFailure {
    fn from(fault: ParserFault) -> Self {
        match fault {
            ParserFault::LimitBreached(detail) => UploadFailure::LimitExceeded(detail),
            ParserFault::Malformed(detail) => UploadFailure::ParserFailed(detail),
        }
    }
}

impl From<UploadFailure> for AppError {
    fn from(failure: UploadFailure) -> Self {
        match failure {
            UploadFailure::Rejected(detail) => AppError::UploadRejected(detail),
            UploadFailure::LimitExceeded(detail) => AppError::PayloadTooLarge(detail),
            UploadFailure::ParserFailed(detail) => AppError::UploadFailed(detail),
            UploadFailure::Provisioning(detail) => AppError::StorageProvisioning(detail),
            UploadFailure::Unexpected(detail) => AppError::Internal(detail),
        }
    }
}

/// Final decision for one request. Computed once and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub accepted_count: usize,
    pub failed_count: usize,
    pub limit_breached: bool,
    pub error_detail: Option<UploadFailure>,
}

impl UploadOutcome {
    /// Outcome for a request that failed before any part was read
    pub fn failed(failure: UploadFailure) -> Self {
        Self {
            accepted_count: 0,
            failed_count: 0,
            limit_breached: matches!(failure, UploadFailure::LimitExceeded(_)),
            error_detail: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_detail.is_none()
    }

    pub fn into_result(self) -> Result<Self, AppError> {
        match self.error_detail.clone() {
            None => Ok(self),
            Some(failure) => Err(failure.into()),
        }
    }
}
