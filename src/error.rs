//! Error types for the Pagemark server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::annotations::{EditorError, StoreError, ValidationError};
use crate::documents::DocumentError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request body: {message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Document error: {0}")]
    Document(DocumentError),
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(name) => AppError::NotFound(format!("Document not found: {}", name)),
            DocumentError::InvalidName(name) => {
                AppError::BadRequest(format!("Invalid document name: {:?}", name))
            }
            other => AppError::Document(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<EditorError> for AppError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::Validation(e) => AppError::Validation(e),
            EditorError::Document(e) => e.into(),
            EditorError::Store(e) => AppError::Store(e),
            e @ EditorError::CommentNotFound { .. } => AppError::NotFound(e.to_string()),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            AppError::InvalidBody { status, message } => (*status, "invalid_body", message.clone()),
            AppError::Validation(e) => {
                tracing::debug!("Validation failed: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "validation_error",
                    e.to_string(),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    "Storage error".to_string(),
                )
            }
            AppError::Document(e) => {
                tracing::error!("Document error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "document_error",
                    "Failed to read document".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
