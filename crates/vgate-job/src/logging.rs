//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for each upload's lifecycle with
//! the upload ID attached to every event.

use tracing::{debug, error, info, warn};
use vgate_models::{JobStage, UploadId};

/// Job logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct JobLogger {
    upload_id: String,
    operation: String,
}

impl JobLogger {
    /// Create a new job logger for an upload and operation.
    ///
    /// # Arguments
    /// * `upload_id` - The upload this job belongs to
    /// * `operation` - The type of operation (e.g., "process_video")
    pub fn new(upload_id: &UploadId, operation: &str) -> Self {
        Self {
            upload_id: upload_id.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Log a lifecycle transition.
    pub fn log_stage(&self, stage: JobStage) {
        info!(
            upload_id = %self.upload_id,
            operation = %self.operation,
            stage = %stage,
            "Upload stage: {}", stage
        );
    }

    /// Log one line the job wrote to stderr.
    pub fn log_stderr_line(&self, line: &str) {
        debug!(
            upload_id = %self.upload_id,
            operation = %self.operation,
            "job stderr: {}", line
        );
    }

    /// Log a warning during job execution.
    pub fn log_warning(&self, message: &str) {
        warn!(
            upload_id = %self.upload_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    /// Log an error during job execution.
    pub fn log_error(&self, message: &str) {
        error!(
            upload_id = %self.upload_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job with its duration.
    pub fn log_completion(&self, duration_ms: u64) {
        info!(
            upload_id = %self.upload_id,
            operation = %self.operation,
            duration_ms = duration_ms,
            "Job completed in {}ms", duration_ms
        );
    }
}
