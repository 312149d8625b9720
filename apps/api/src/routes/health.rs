use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version, and whether the typesetting engine can be launched.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let engine = state.compiler.engine();
    let available = engine.is_available().await;
    let status = if available { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resumetex",
        "engine": {
            "name": engine.name(),
            "available": available
        }
    }))
}
