//! Response bodies of the upload endpoint.
//!
//! Message strings are part of the wire contract with the existing front end.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Message sent with a successful upload.
pub const MSG_PROCESSING_COMPLETE: &str = "処理完了";
/// Error sent when the request has no video file.
pub const MSG_VIDEO_REQUIRED: &str = "動画ファイルが必要です";
/// Error sent when the external job fails.
pub const MSG_PROCESSING_FAILED: &str = "動画処理失敗";

/// 200 body of `POST /uploads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Trimmed stdout of the job
    pub output: String,
}

impl UploadResponse {
    pub fn completed(output: impl Into<String>) -> Self {
        Self {
            message: MSG_PROCESSING_COMPLETE.to_string(),
            output: output.into(),
        }
    }
}

/// Error body; `stderr` is present only for job failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stderr: None,
        }
    }

    pub fn with_stderr(error: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            stderr: Some(stderr.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_body_omits_empty_stderr() {
        let value = serde_json::to_value(ErrorBody::new(MSG_VIDEO_REQUIRED)).unwrap();
        assert_eq!(value, json!({ "error": MSG_VIDEO_REQUIRED }));
    }

    #[test]
    fn test_job_failure_body() {
        let value =
            serde_json::to_value(ErrorBody::with_stderr(MSG_PROCESSING_FAILED, "ERRTEXT")).unwrap();
        assert_eq!(value["stderr"], "ERRTEXT");
    }
}
