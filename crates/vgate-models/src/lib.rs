//! Shared data models for the vgate upload gateway.
//!
//! This crate provides Serde-serializable types for:
//! - Uploaded files and their caller-supplied metadata
//! - External job invocations and their captured output
//! - Response bodies of the upload endpoint

pub mod job;
pub mod response;
pub mod upload;

// Re-export common types
pub use job::{JobInvocation, JobOutput, JobStage};
pub use response::{
    ErrorBody, UploadResponse, MSG_PROCESSING_COMPLETE, MSG_PROCESSING_FAILED, MSG_VIDEO_REQUIRED,
};
pub use upload::{
    resolve_video_name, storage_name_for, UploadId, UploadMetadata, UploadedFile,
    DEFAULT_VIDEO_EXTENSION,
};
