use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::compile::CompileError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The request body could not be read as a compile request.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::Validation(rejection.body_text())
        }
    }
}

/// Status and machine-readable code for a compile error. Document problems are the
/// caller's to fix (4xx); everything else is an environment fault (5xx).
fn compile_status(err: &CompileError) -> (StatusCode, &'static str) {
    match err {
        CompileError::InvalidDocument { .. } => (StatusCode::BAD_REQUEST, "INVALID_DOCUMENT"),
        CompileError::CompilationFailed { .. } => (StatusCode::BAD_REQUEST, "COMPILATION_FAILED"),
        CompileError::Timeout { .. } => (StatusCode::BAD_REQUEST, "COMPILATION_TIMEOUT"),
        CompileError::EngineUnavailable { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "ENGINE_UNAVAILABLE")
        }
        CompileError::Workspace(_) => (StatusCode::INTERNAL_SERVER_ERROR, "WORKSPACE_ERROR"),
        CompileError::TemplateAssets(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "TEMPLATE_ASSET_ERROR")
        }
        CompileError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Compile(e) => {
                let (status, code) = compile_status(e);
                if status.is_server_error() {
                    tracing::error!("Compile error: {e:?}");
                }
                (status, code, e.message(), Some(e.details()))
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Invalid request body".to_string(),
                Some(msg.clone()),
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                "Request body is too large".to_string(),
                Some(msg.clone()),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "details": details
            }
        }));

        (status, body).into_response()
    }
}
