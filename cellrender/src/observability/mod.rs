//! Tracing subscriber setup.

use crate::config::LogConfig;
use crate::errors::CellRenderError;
use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns
/// [`CellRenderError::Logging`] when the directive is invalid or a global
/// subscriber is already installed; callers embedding the crate in a host
/// that configures its own subscriber can ignore that error.
pub fn init_tracing(config: &LogConfig) -> Result<(), CellRenderError> {
    let filter = build_filter(config)?;

    let installed = if config.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };

    installed.map_err(|e| CellRenderError::Logging(e.to_string()))
}

fn build_filter(config: &LogConfig) -> Result<EnvFilter, CellRenderError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| CellRenderError::Logging(e.to_string()))
}
