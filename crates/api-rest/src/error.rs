//! The REST error envelope.
//!
//! Every failure leaving this API carries a stable machine-readable code
//! plus a human message, serialised as `{"code": "...", "message": "..."}`
//! with the status on the response line. Core errors map onto the
//! envelope here, in one place, so handlers stay thin.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use mural_core::{CoreError, FilesError};

/// Wire form of an API failure.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `post_not_found`
    pub code: String,
    /// Human-readable message for display
    pub message: String,
}

/// An API failure: status plus the error envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, code, message)
    }

    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::PostNotFound => Self::not_found("post_not_found", "Post not found."),
            CoreError::PostNotPublished => {
                Self::forbidden("post_not_published", "Post is not published.")
            }
            CoreError::EditingNotEnabled => Self::forbidden(
                "editing_not_enabled",
                "Public editing is not enabled for this post.",
            ),
            CoreError::GraffitiNotEnabled => Self::forbidden(
                "graffiti_not_enabled",
                "Graffiti is not enabled for this post.",
            ),
            CoreError::Validation { code, message } => Self::validation(code, message),
            CoreError::Storage(files_err) => match files_err {
                FilesError::BlobNotFound(_) | FilesError::InvalidHash(_) => {
                    Self::not_found("media_not_found", "Media not found.")
                }
                other => {
                    tracing::error!(error = %other, "media storage failed");
                    Self::internal("upload_failed", "Failed to store image.")
                }
            },
            CoreError::CleanupAfterSubmitFailed {
                record_id,
                submit_error,
                cleanup_error,
            } => {
                tracing::error!(
                    record_id,
                    submit_error = %submit_error,
                    cleanup_error = %cleanup_error,
                    "storage failure with failed record cleanup"
                );
                Self::internal("upload_failed", "Failed to store image.")
            }
            other => {
                tracing::error!(error = %other, "internal error");
                Self::internal("internal_error", "Internal error.")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }

        let body = ErrorBody {
            code: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_errors_map_to_distinct_statuses() {
        let not_found = ApiError::from(CoreError::PostNotFound);
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.code(), "post_not_found");

        let unpublished = ApiError::from(CoreError::PostNotPublished);
        assert_eq!(unpublished.status(), StatusCode::FORBIDDEN);
        assert_eq!(unpublished.code(), "post_not_published");

        let no_editing = ApiError::from(CoreError::EditingNotEnabled);
        assert_eq!(no_editing.status(), StatusCode::FORBIDDEN);
        assert_eq!(no_editing.code(), "editing_not_enabled");
    }

    #[test]
    fn test_validation_carries_original_code() {
        let err = ApiError::from(CoreError::validation("invalid_image", "Invalid image data."));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "invalid_image");
    }

    #[test]
    fn test_missing_blob_is_not_found() {
        let err = ApiError::from(CoreError::Storage(FilesError::BlobNotFound("abc".into())));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "media_not_found");
    }

    #[test]
    fn test_storage_write_failure_is_500() {
        let io = std::io::Error::other("disk full");
        let err = ApiError::from(CoreError::Storage(FilesError::Io(io)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "upload_failed");
    }
}
