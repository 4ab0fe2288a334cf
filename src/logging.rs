//! Logging configuration using tracing
//!
//! Structured logging to stderr. RUST_LOG takes precedence over the filter
//! passed in (normally `ProjectFlowConfig::log_filter`).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// # Example filters
/// - `warn` - quiet, only problems (default)
/// - `projectflow=debug` - codec and adapter steps
/// - `projectflow::sync=info` - one line per created resource
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already installed
pub fn init(default_filter: &str) -> crate::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| {
            crate::ProjectFlowError::Config(format!("Invalid log filter '{}': {}", default_filter, e))
        })?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .map_err(|e| {
            crate::ProjectFlowError::Config(format!("Failed to initialize tracing: {}", e))
        })?;

    Ok(())
}

/// Initialize logging for tests (no-op if already initialized)
pub fn init_test() {
    let _ = init("debug");
}
