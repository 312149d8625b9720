use std::sync::Arc;

use crate::compile::LatexCompiler;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Shared by every request; each compilation still gets its own workspace.
    pub compiler: Arc<LatexCompiler>,
}
