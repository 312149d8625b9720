//! Axum route handler for the Compile API.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use crate::compile::CompilationRequest;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/compile
///
/// Compiles LaTeX source (plus optional class file and template assets) to a PDF.
/// Returns the PDF inline, or a JSON error with `message` and `details`. Bodies that
/// are not a JSON compile request get the same error envelope.
///
/// The pipeline runs on its own task so a client that disconnects mid-compile does
/// not cut the run short; the workspace is always cleaned up.
pub async fn handle_compile(
    State(state): State<AppState>,
    payload: Result<Json<CompilationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let compiler = Arc::clone(&state.compiler);

    let pdf = tokio::spawn(async move { compiler.compile(&request).await })
        .await
        .map_err(|e| AppError::Internal(anyhow!("compile task failed: {e}")))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "inline; filename=resume.pdf"),
        ],
        pdf.bytes,
    )
        .into_response())
}
