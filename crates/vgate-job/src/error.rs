//! Error types for external job execution.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Errors that can occur while running the external job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job program not found: {0}")]
    ProgramNotFound(PathBuf),

    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Job exited with status {}", exit_label(.exit_code))]
    Failed {
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Job timed out after {0:?}")]
    Timeout(Duration),

    #[error("Job cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_label(exit_code: &Option<i32>) -> String {
    exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl JobError {
    /// Create a spawn failure error.
    pub fn spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Create a non-zero exit error.
    pub fn failed(stderr: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::Failed {
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Text reported to the caller in place of the job's stderr.
    ///
    /// For a job that ran and failed this is exactly what it wrote to stderr;
    /// otherwise it describes why no stderr exists.
    pub fn stderr_text(&self) -> String {
        match self {
            JobError::Failed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }

    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::ProgramNotFound(_) => "program_not_found",
            JobError::Spawn { .. } => "spawn",
            JobError::Failed { .. } => "failed",
            JobError::Timeout(_) => "timeout",
            JobError::Cancelled => "cancelled",
            JobError::Io(_) => "io",
            JobError::Internal(_) => "internal",
        }
    }
}
