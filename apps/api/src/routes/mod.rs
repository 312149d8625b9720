pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::compile::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Compile API
        .route("/api/compile", post(handlers::handle_compile))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::compile::testing::{StubBehavior, StubEngine};
    use crate::compile::{LatexCompiler, LocalTemplateStore};
    use crate::config::Config;

    const ARTICLE: &str = "\\documentclass{article}\n\\begin{document}\nHello\n\\end{document}";

    fn app(dir: &TempDir, behavior: StubBehavior) -> Router {
        app_with_config(dir, behavior, Config::from_lookup(|_| None).unwrap())
    }

    fn app_with_config(dir: &TempDir, behavior: StubBehavior, config: Config) -> Router {
        let compiler = LatexCompiler::new(
            Arc::new(StubEngine::new(behavior)),
            Arc::new(LocalTemplateStore::new(dir.path().join("templates"))),
            dir.path().join("temp"),
            Duration::from_secs(45),
        );
        build_router(AppState {
            config,
            compiler: Arc::new(compiler),
        })
    }

    fn compile_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/compile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_compile_returns_pdf() {
        let dir = TempDir::new().unwrap();
        let app = app(
            &dir,
            StubBehavior::Pdf {
                bytes: b"%PDF-1.4 stub".to_vec(),
                code: 0,
            },
        );

        let response = app
            .oneshot(compile_request(json!({ "texContent": ARTICLE })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=resume.pdf"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 stub");
    }

    #[tokio::test]
    async fn test_empty_content_is_bad_request_without_workspace() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, StubBehavior::Silent);

        let response = app
            .oneshot(compile_request(json!({ "texContent": "" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Empty LaTeX content");
        assert!(!dir.path().join("temp").exists());
    }

    #[tokio::test]
    async fn test_diagnosed_failure_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let app = app(
            &dir,
            StubBehavior::Log("! LaTeX Error: File `moderncv.cls' not found.\n".to_string()),
        );

        let response = app
            .oneshot(compile_request(json!({ "texContent": ARTICLE })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "COMPILATION_FAILED");
        assert_eq!(
            body["error"]["message"],
            "LaTeX Error: File `moderncv.cls' not found."
        );
    }

    #[tokio::test]
    async fn test_missing_engine_is_server_error() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, StubBehavior::MissingBinary);

        let response = app
            .oneshot(compile_request(json!({ "source": ARTICLE })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "ENGINE_UNAVAILABLE");
        assert!(body["error"]["details"]
            .as_str()
            .unwrap()
            .contains("install"));
    }

    #[tokio::test]
    async fn test_health_reports_engine() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, StubBehavior::MissingBinary);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["engine"]["name"], "stub-xelatex");
        assert_eq!(body["engine"]["available"], false);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, StubBehavior::Silent);

        let request = Request::builder()
            .method("POST")
            .uri("/api/compile")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"texContent\": "))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Invalid request body");
        assert!(body["error"]["details"].is_string());
        assert!(!dir.path().join("temp").exists());
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_error_envelope() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, StubBehavior::Silent);

        let request = Request::builder()
            .method("POST")
            .uri("/api/compile")
            .body(Body::from(json!({ "texContent": ARTICLE }).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let dir = TempDir::new().unwrap();
        let config =
            Config::from_lookup(|key| (key == "MAX_BODY_BYTES").then(|| "64".to_string())).unwrap();
        let app = app_with_config(&dir, StubBehavior::Silent, config);

        let padding = "%".repeat(256);
        let response = app
            .oneshot(compile_request(json!({ "texContent": format!("{ARTICLE}\n{padding}") })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await["error"]["code"], "PAYLOAD_TOO_LARGE");
    }
}
