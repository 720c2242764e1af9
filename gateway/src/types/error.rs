//! Universal error handling for the API

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{admission::AdmissionDenied, media_storage::StorageError};

/// Error envelope returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub error: String,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                success: false,
                error: message.into(),
            },
        }
    }

    /// A request missing a required field or carrying an unreadable body
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Required server configuration is absent or inconsistent
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Message carried in the response body
    #[must_use]
    pub fn message(&self) -> &str {
        &self.inner.error
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.status, self.inner.error),
            500..=599 => tracing::error!("Server error: {} - {}", self.status, self.inner.error),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert admission refusals to application errors
impl From<AdmissionDenied> for AppError {
    fn from(err: AdmissionDenied) -> Self {
        let status = match err {
            AdmissionDenied::Unauthorized => StatusCode::UNAUTHORIZED,
            AdmissionDenied::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AdmissionDenied::NoFiles
            | AdmissionDenied::TooManyFiles { .. }
            | AdmissionDenied::FileTooLarge { .. }
            | AdmissionDenied::MissingPublicUrl => StatusCode::BAD_REQUEST,
        };

        Self::new(status, err.to_string())
    }
}

/// Convert storage errors to application errors
impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidUrl(_) => Self::malformed(err.to_string()),
            StorageError::ConfigError(_) => Self::configuration(err.to_string()),
            StorageError::S3Error(_)
            | StorageError::AwsError(_)
            | StorageError::UpstreamError(_)
            | StorageError::NotFound(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        }
    }
}

/// Errors raised while reading a multipart body
impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

/// Requests that are not multipart at all
impl From<MultipartRejection> for AppError {
    fn from(err: MultipartRejection) -> Self {
        Self::new(err.status(), err.body_text())
    }
}
