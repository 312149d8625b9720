use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default, so a bare `.env`-less start works for local dev.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Binary invoked to typeset documents (`xelatex` unless overridden).
    pub latex_engine: String,
    pub compile_timeout: Duration,
    /// Root under which per-request workspaces are created.
    pub temp_dir: PathBuf,
    /// Root of the template asset store (one directory per template).
    pub templates_dir: PathBuf,
    pub max_body_bytes: usize,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ENGINE: &str = "xelatex";
const DEFAULT_TIMEOUT_SECS: u64 = 45;
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            None => DEFAULT_PORT,
        };

        let timeout_secs = match lookup("COMPILE_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("COMPILE_TIMEOUT_SECS must be a whole number of seconds")?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        if timeout_secs == 0 {
            anyhow::bail!("COMPILE_TIMEOUT_SECS must be greater than zero");
        }

        let max_body_bytes = match lookup("MAX_BODY_BYTES") {
            Some(raw) => raw
                .parse::<usize>()
                .context("MAX_BODY_BYTES must be a byte count")?,
            None => DEFAULT_MAX_BODY_BYTES,
        };

        Ok(Config {
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            latex_engine: lookup("LATEX_ENGINE").unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
            compile_timeout: Duration::from_secs(timeout_secs),
            temp_dir: lookup("COMPILE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("temp")),
            templates_dir: lookup("TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("templates")),
            max_body_bytes,
        })
    }
}
