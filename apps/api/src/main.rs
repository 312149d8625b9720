mod compile;
mod config;
mod errors;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compile::LatexCompiler;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; malformed values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resumetex v{}", env!("CARGO_PKG_VERSION"));

    let compiler = LatexCompiler::from_config(&config);
    if compiler.engine().is_available().await {
        info!("LaTeX engine '{}' available", compiler.engine().name());
    } else {
        // Keep serving: /health reports the problem and compiles return install guidance.
        warn!(
            "LaTeX engine '{}' could not be launched; compile requests will fail until it is installed",
            compiler.engine().name()
        );
    }
    info!(
        "Workspaces under {}, templates from {}, timeout {}s",
        config.temp_dir.display(),
        config.templates_dir.display(),
        config.compile_timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        compiler: Arc::new(compiler),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the editor client's host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
