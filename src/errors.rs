// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: One variant per failure class of a drop/upload/record/reload cycle
/// Each variant maps to appropriate HTTP status code and error response
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl GalleryError {
    fn code(&self) -> (StatusCode, &'static str) {
        match self {
            GalleryError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            GalleryError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            GalleryError::UnsupportedMediaType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "INVALID_INPUT")
            }
            GalleryError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            GalleryError::UploadFailed(_) => (StatusCode::BAD_GATEWAY, "UPLOAD_FAILED"),
            GalleryError::StorageError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR")
            }
            GalleryError::DatabaseError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        }
    }
}

impl From<std::io::Error> for GalleryError {
    fn from(err: std::io::Error) -> Self {
        GalleryError::StorageError(err.to_string())
    }
}

/// Convert GalleryError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses
impl ResponseError for GalleryError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = self.code();

        let body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.code().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GalleryError::UnsupportedMediaType("text/plain".into()).status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            GalleryError::UploadFailed("boom".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GalleryError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_io_error_maps_to_storage_error() {
        let err: GalleryError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert!(matches!(err, GalleryError::StorageError(_)));
    }
}
