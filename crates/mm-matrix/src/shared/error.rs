//! Matrix Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum MatrixError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Another write on the same cell has not finished yet; retry later.
    #[error("Membership of {principal_id} in {group_id} is being updated, retry later")]
    CellBusy { group_id: String, principal_id: String },

    #[error("Directory error: {message}")]
    Directory { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MatrixError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn cell_busy(group_id: impl Into<String>, principal_id: impl Into<String>) -> Self {
        Self::CellBusy {
            group_id: group_id.into(),
            principal_id: principal_id.into(),
        }
    }

    pub fn directory(message: impl Into<String>) -> Self {
        Self::Directory { message: message.into() }
    }

    /// Whether the same request may succeed if issued again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CellBusy { .. })
    }
}

pub type Result<T> = std::result::Result<T, MatrixError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for MatrixError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            MatrixError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            MatrixError::Validation { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            MatrixError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            MatrixError::CellBusy { .. } => (StatusCode::CONFLICT, "CELL_BUSY"),
            MatrixError::Directory { .. } | MatrixError::Http(_) => {
                (StatusCode::BAD_GATEWAY, "DIRECTORY_ERROR")
            }
            MatrixError::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (MatrixError::not_found("Group", "editors"), StatusCode::NOT_FOUND),
            (MatrixError::validation("bad"), StatusCode::BAD_REQUEST),
            (MatrixError::forbidden("no"), StatusCode::FORBIDDEN),
            (MatrixError::cell_busy("editors", "alice"), StatusCode::CONFLICT),
            (MatrixError::directory("down"), StatusCode::BAD_GATEWAY),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_only_cell_busy_is_retryable() {
        assert!(MatrixError::cell_busy("editors", "alice").is_retryable());
        assert!(!MatrixError::directory("down").is_retryable());
    }
}
