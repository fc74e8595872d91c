use std::sync::Arc;

use axum::{body::Body, extract::State, http::HeaderMap, http::StatusCode, Json};

use crate::error::{HttpAppError, SuccessResponse};
use crate::services::upload::UploadOrchestrator;
use crate::state::AppState;

/// Upload files handler
///
/// Streams every file part of a `multipart/form-data` body into storage. The request
/// is all-or-nothing: either every file part is stored or none is.
///
/// # Errors
/// - `AppError::UploadRejected` - a part was rejected or failed to persist (500)
/// - `AppError::PayloadTooLarge` - per-part size or part-count limit exceeded (413)
/// - `AppError::UploadFailed` - malformed or interrupted multipart body (500)
/// - `AppError::StorageProvisioning` - upload directory unavailable (500)
#[tracing::instrument(skip(state, headers, body), fields(operation = "upload_files"))]
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<SuccessResponse>), HttpAppError> {
    let outcome = UploadOrchestrator::new(&state.upload)
        .run(&headers, body)
        .await
        .into_result()?;

    tracing::info!(
        accepted_count = outcome.accepted_count,
        "All files uploaded successfully"
    );

    Ok((
        StatusCode::OK,
        Json(SuccessResponse::new("All files uploaded successfully")),
    ))
}
