//! Job dispatch: run the external job for a stored upload and clean up.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;

use vgate_job::{JobCommand, JobLogger, JobRunner};
use vgate_models::{JobInvocation, JobStage, UploadResponse};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::intake::StoredUpload;
use crate::metrics;

/// Invokes the external processing job, one call per upload.
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    program: PathBuf,
    leading_args: Vec<String>,
    timeout: Option<Duration>,
    /// Flips to `true` on server shutdown
    shutdown_rx: watch::Receiver<bool>,
}

impl JobDispatcher {
    pub fn new(config: &ApiConfig, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            program: config.job_program.clone(),
            leading_args: config.job_args.clone(),
            timeout: config.job_timeout,
            shutdown_rx,
        }
    }

    /// Build the invocation for a stored upload.
    pub fn invocation_for(&self, upload: &StoredUpload) -> JobInvocation {
        JobInvocation::new(
            &self.program,
            self.leading_args.clone(),
            &upload.file.path,
            upload.file.video_name(&upload.metadata),
            &upload.metadata,
        )
    }

    /// Run the job, delete the upload, and map the outcome.
    ///
    /// The file is deleted exactly once after the job terminates, whether it
    /// succeeded or not. A failed deletion is logged and does not change the
    /// response.
    pub async fn dispatch(
        &self,
        upload: StoredUpload,
        logger: &JobLogger,
    ) -> ApiResult<UploadResponse> {
        let invocation = self.invocation_for(&upload);
        let cmd = JobCommand::from_invocation(&invocation);
        let runner = JobRunner::new()
            .with_cancel(self.shutdown_rx.clone())
            .with_optional_timeout(self.timeout);

        logger.log_stage(JobStage::JobRunning);
        let stderr_logger = logger.clone();
        let result = runner
            .run_with_stderr(&cmd, move |line| stderr_logger.log_stderr_line(line))
            .await;

        match &result {
            Ok(output) => {
                logger.log_stage(JobStage::JobSucceeded);
                logger.log_completion(output.duration_ms);
                metrics::record_job_succeeded(output.duration_ms as f64 / 1000.0);
            }
            Err(e) => {
                logger.log_stage(JobStage::JobFailed);
                logger.log_error(&format!("{}: {}", e, e.stderr_text()));
                metrics::record_job_failed(e.kind());
            }
        }

        match upload.temp.remove().await {
            Ok(true) => logger.log_stage(JobStage::FileDeleted),
            Ok(false) => {
                logger.log_warning("Upload was already gone before cleanup");
                logger.log_stage(JobStage::FileDeleted);
            }
            Err(e) => {
                logger.log_warning(&format!(
                    "Failed to delete {}: {}",
                    upload.file.path.display(),
                    e
                ));
                metrics::record_cleanup_failure();
            }
        }

        let output = result.map_err(|e| ApiError::job_execution(e.stderr_text()))?;
        Ok(UploadResponse::completed(output.result_text()))
    }
}
