//! Upload intake: multipart parsing and temp-file persistence.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use vgate_job::TempFile;
use vgate_models::{storage_name_for, UploadId, UploadMetadata, UploadedFile};

use crate::error::{ApiError, ApiResult};

/// Form field that carries the video.
pub const VIDEO_FIELD: &str = "video";

/// An upload that has been written to the working directory.
///
/// `temp` owns the file on disk; dropping it without calling
/// [`TempFile::remove`] deletes the file.
#[derive(Debug)]
pub struct StoredUpload {
    pub id: UploadId,
    pub file: UploadedFile,
    pub metadata: UploadMetadata,
    pub temp: TempFile,
}

/// Parses upload requests and persists the video.
#[derive(Debug, Clone)]
pub struct Intake {
    upload_dir: PathBuf,
}

impl Intake {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Read the whole multipart body, streaming the `video` part to disk.
    ///
    /// Text fields may arrive before or after the file. On any error the
    /// partially written file is removed.
    pub async fn receive(&self, id: UploadId, mut multipart: Multipart) -> ApiResult<StoredUpload> {
        let mut metadata = UploadMetadata::default();
        let mut stored: Option<(TempFile, UploadedFile)> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::multipart("Failed to read multipart", e))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                // Browsers send an empty filename when no file was chosen
                Some(original_name) if original_name.is_empty() => {
                    debug!(upload_id = %id, field = %name, "Ignoring empty file part");
                }
                Some(original_name) if name == VIDEO_FIELD => {
                    if stored.is_some() {
                        return Err(ApiError::bad_request("Only one video file is accepted"));
                    }
                    stored = Some(self.store_field(&id, original_name, field).await?);
                }
                Some(original_name) => {
                    debug!(upload_id = %id, field = %name, "Ignoring file field {}", original_name);
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::multipart("Failed to read form field", e))?;
                    if !metadata.set_field(&name, value) {
                        debug!(upload_id = %id, field = %name, "Ignoring unknown form field");
                    }
                }
            }
        }

        let (temp, file) = stored.ok_or(ApiError::MissingFile)?;

        info!(
            upload_id = %id,
            course = metadata.course.as_deref().unwrap_or_default(),
            section = metadata.section.as_deref().unwrap_or_default(),
            title = metadata.title.as_deref().unwrap_or_default(),
            video_id = metadata.video_id.as_deref().unwrap_or_default(),
            original_name = %file.original_name,
            size = file.size,
            "Received upload metadata"
        );

        Ok(StoredUpload {
            id,
            file,
            metadata,
            temp,
        })
    }

    /// Stream one file part into a new file in the working directory.
    async fn store_field(
        &self,
        id: &UploadId,
        original_name: String,
        mut field: Field<'_>,
    ) -> ApiResult<(TempFile, UploadedFile)> {
        let storage_name = storage_name_for(id, &original_name);
        let path = self.upload_dir.join(&storage_name);

        let (temp, mut file) = TempFile::create(&path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create {}: {}", path.display(), e)))?;

        let mut size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::multipart("Failed to read file data", e))?
        {
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        debug!(upload_id = %id, "Stored {} ({} bytes)", path.display(), size);

        Ok((
            temp,
            UploadedFile {
                storage_name,
                path,
                size,
                original_name,
            },
        ))
    }
}
