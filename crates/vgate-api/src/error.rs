//! API error types.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use vgate_models::{ErrorBody, MSG_PROCESSING_FAILED, MSG_VIDEO_REQUIRED};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The multipart body had no `video` file part.
    #[error("{}", MSG_VIDEO_REQUIRED)]
    MissingFile,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The external job failed, could not start, or was stopped.
    #[error("{}", MSG_PROCESSING_FAILED)]
    JobExecution { stderr: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal failure whose detail is withheld from the client.
    #[error("An internal error occurred")]
    Redacted,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn job_execution(stderr: impl Into<String>) -> Self {
        Self::JobExecution {
            stderr: stderr.into(),
        }
    }

    /// Map a failure while reading multipart data.
    pub fn multipart(context: &str, err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(err.body_text())
        } else {
            Self::BadRequest(format!("{}: {}", context, err.body_text()))
        }
    }

    /// Hide internal error detail when running in production.
    ///
    /// Job stderr is part of the endpoint's response and is never hidden.
    pub fn redacted(self, production: bool) -> Self {
        match self {
            ApiError::Internal(_) | ApiError::Io(_) if production => ApiError::Redacted,
            other => other,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFile | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::JobExecution { .. }
            | ApiError::Internal(_)
            | ApiError::Io(_)
            | ApiError::Redacted => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match &self {
            ApiError::JobExecution { stderr } => {
                ErrorBody::with_stderr(MSG_PROCESSING_FAILED, stderr.clone())
            }
            _ => ErrorBody::new(self.to_string()),
        };

        (status, Json(body)).into_response()
    }
}
