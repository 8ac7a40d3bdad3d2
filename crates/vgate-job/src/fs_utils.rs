//! Filesystem utilities for transient upload files.
//!
//! An upload lives on disk only while its job runs. [`TempFile`] owns that
//! file: [`TempFile::remove`] deletes it once after the job, and dropping an
//! unremoved guard (an early error or an abandoned request) deletes it too.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::JobResult;

/// Remove a file, treating "already absent" as success.
///
/// Returns `true` if a file was deleted and `false` if there was nothing to
/// delete.
pub async fn remove_if_exists(path: impl AsRef<Path>) -> JobResult<bool> {
    match fs::remove_file(path.as_ref()).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Owner of a temporary upload file.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    /// Cleared once the file has been explicitly removed
    armed: bool,
}

impl TempFile {
    /// Take ownership of an existing path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    /// Create a new, empty file at `path` and take ownership of it.
    ///
    /// Fails if the path already exists; uploads never overwrite each other.
    pub async fn create(path: impl Into<PathBuf>) -> JobResult<(Self, fs::File)> {
        let path = path.into();
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok((Self::new(path), file))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file.
    ///
    /// Consumes the guard, so a file is never deleted twice. A missing file is
    /// not an error.
    pub async fn remove(mut self) -> JobResult<bool> {
        self.armed = false;
        remove_if_exists(&self.path).await
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed abandoned upload {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove abandoned upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
