//! Uploaded file and metadata models.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Extension used when the upload's original name has none.
pub const DEFAULT_VIDEO_EXTENSION: &str = ".mp4";

/// Unique identifier for a single upload request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct UploadId(pub Uuid);

impl UploadId {
    /// Generate a new random upload ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Hyphen-less form, used inside storage names.
    pub fn simple(&self) -> String {
        self.0.simple().to_string()
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-supplied metadata sent alongside the video.
///
/// All fields are free-form and unvalidated; they are only forwarded to the
/// external job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Display title; overrides the name derived from the file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// External video identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

impl UploadMetadata {
    /// Assign a multipart text field by its form name.
    ///
    /// Returns `false` for names that are not metadata fields.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "course" => &mut self.course,
            "section" => &mut self.section,
            "title" => &mut self.title,
            "videoId" => &mut self.video_id,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A video persisted to the working directory for the lifetime of one request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadedFile {
    /// Generated file name inside the working directory
    pub storage_name: String,

    /// Location on local disk
    pub path: PathBuf,

    /// Size in bytes
    pub size: u64,

    /// Name the client sent with the file part
    pub original_name: String,
}

impl UploadedFile {
    /// Name passed to the job: the title when given, else the file stem.
    pub fn video_name(&self, metadata: &UploadMetadata) -> String {
        resolve_video_name(metadata.title.as_deref(), &self.original_name)
    }
}

/// Generate a collision-free storage name for an upload.
///
/// Format: `upload-<unix millis>-<upload id><ext>`. The extension comes from the
/// original name and falls back to [`DEFAULT_VIDEO_EXTENSION`].
pub fn storage_name_for(id: &UploadId, original_name: &str) -> String {
    storage_name_at(id, original_name, Utc::now().timestamp_millis())
}

fn storage_name_at(id: &UploadId, original_name: &str, millis: i64) -> String {
    format!(
        "upload-{}-{}{}",
        millis,
        id.simple(),
        extension_of(original_name)
    )
}

/// Extension of the original name with a leading dot, case preserved.
///
/// Client names are untrusted, so anything that is not plain alphanumeric
/// falls back to the default.
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .file_name()
        .map(Path::new)
        .and_then(|name| name.extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| DEFAULT_VIDEO_EXTENSION.to_string())
}

/// Resolve the video name handed to the external job.
///
/// A non-empty title wins; otherwise the original file name with its final
/// extension stripped.
pub fn resolve_video_name(title: Option<&str>, original_name: &str) -> String {
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    Path::new(original_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| original_name.to_string())
}
