//! External job invocation models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::upload::UploadMetadata;

/// One call of the external processing job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobInvocation {
    /// Executable to run
    pub program: PathBuf,

    /// Arguments placed before the positional contract (e.g. a script path)
    #[serde(default)]
    pub leading_args: Vec<String>,

    /// Stored upload on disk
    pub file_path: PathBuf,

    /// Resolved video name
    pub video_name: String,

    pub course: String,
    pub section: String,
    pub video_id: String,
}

impl JobInvocation {
    /// Create an invocation for a stored upload.
    ///
    /// Absent metadata fields become empty strings so positions never shift.
    pub fn new(
        program: impl AsRef<Path>,
        leading_args: Vec<String>,
        file_path: impl AsRef<Path>,
        video_name: impl Into<String>,
        metadata: &UploadMetadata,
    ) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            leading_args,
            file_path: file_path.as_ref().to_path_buf(),
            video_name: video_name.into(),
            course: metadata.course.clone().unwrap_or_default(),
            section: metadata.section.clone().unwrap_or_default(),
            video_id: metadata.video_id.clone().unwrap_or_default(),
        }
    }

    /// The positional contract: file path, video name, course, section, videoId.
    pub fn positional_args(&self) -> [String; 5] {
        [
            self.file_path.to_string_lossy().into_owned(),
            self.video_name.clone(),
            self.course.clone(),
            self.section.clone(),
            self.video_id.clone(),
        ]
    }

    /// Full argument list: leading args followed by the positional contract.
    pub fn args(&self) -> Vec<String> {
        let mut args = self.leading_args.clone();
        args.extend(self.positional_args());
        args
    }
}

/// Captured result of a finished job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct JobOutput {
    /// Everything the job wrote to stdout
    pub stdout: String,
    /// Everything the job wrote to stderr
    pub stderr: String,
    /// Exit code (None when killed by a signal)
    pub exit_code: Option<i32>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl JobOutput {
    /// Result text relayed to the caller.
    pub fn result_text(&self) -> &str {
        self.stdout.trim()
    }
}

/// Lifecycle stage of a single upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Received,
    FileStored,
    JobRunning,
    JobSucceeded,
    JobFailed,
    FileDeleted,
    ResponseSent,
}

impl JobStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStage::Received => "received",
            JobStage::FileStored => "file_stored",
            JobStage::JobRunning => "job_running",
            JobStage::JobSucceeded => "job_succeeded",
            JobStage::JobFailed => "job_failed",
            JobStage::FileDeleted => "file_deleted",
            JobStage::ResponseSent => "response_sent",
        }
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
