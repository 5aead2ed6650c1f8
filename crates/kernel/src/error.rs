//! Application error types.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::directory::{DirectoryError, ErrorKind};

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl AppError {
    /// Machine-readable kind sent alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::NotFound => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Directory(e) => e.kind().as_str(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Directory(e) => directory_status(e.kind()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// HTTP status for a failed directory read.
pub fn directory_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotProvisioned | ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorKind::Malformed => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::Directory(e) => {
                tracing::warn!(table = e.table(), kind = e.kind().as_str(), error = %e, "directory read failed");
                e.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message, "kind": self.kind() }))).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_kinds_map_to_statuses() {
        let cases = [
            (DirectoryError::not_provisioned("markets"), StatusCode::SERVICE_UNAVAILABLE),
            (DirectoryError::permission_denied("markets", "rls"), StatusCode::FORBIDDEN),
            (DirectoryError::transient("markets", "timeout"), StatusCode::SERVICE_UNAVAILABLE),
            (DirectoryError::malformed("markets", "bad"), StatusCode::BAD_GATEWAY),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::from(error).status(), status);
        }
    }

    #[test]
    fn kinds_are_snake_case() {
        assert_eq!(AppError::from(DirectoryError::not_provisioned("x")).kind(), "not_provisioned");
        assert_eq!(AppError::BadRequest("limit".into()).kind(), "bad_request");
    }

    #[test]
    fn internal_errors_hide_details() {
        let response = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
