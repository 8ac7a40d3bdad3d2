//! Upload handler.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::warn;

use vgate_job::JobLogger;
use vgate_models::{JobStage, UploadId, UploadResponse};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// `POST /uploads`: store the video, run the job, relay its output.
///
/// The request stays open until the job exits. If the client goes away
/// first, the job is killed and the upload removed.
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let production = state.config.is_production();
    process_upload(&state, multipart)
        .await
        .map(Json)
        .map_err(|e| e.redacted(production))
}

async fn process_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<UploadResponse> {
    let id = UploadId::new();
    let logger = JobLogger::new(&id, "process_video");
    logger.log_stage(JobStage::Received);

    let upload = match state.intake.receive(id, multipart?).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!(upload_id = %id, "Upload rejected: {}", e);
            metrics::record_upload_rejected(match &e {
                ApiError::MissingFile => "missing_file",
                ApiError::PayloadTooLarge(_) => "too_large",
                _ => "invalid",
            });
            return Err(e);
        }
    };

    metrics::record_upload_received(upload.file.size);
    logger.log_stage(JobStage::FileStored);

    let result = state.dispatcher.dispatch(upload, &logger).await;

    logger.log_stage(JobStage::ResponseSent);
    result
}
