//! # Structured Logging
//!
//! Subscriber setup and span macros for capture and push activity.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

/// Create a tracing span for one captured exchange
///
/// ```rust,ignore
/// let span = capture_span!("POST", "/users/{id}");
/// ```
#[macro_export]
macro_rules! capture_span {
    ($method:expr, $route:expr) => {
        tracing::debug_span!("api_capture", method = %$method, route = %$route)
    };
    ($method:expr, $route:expr, $($field:tt)*) => {
        tracing::debug_span!("api_capture", method = %$method, route = %$route, $($field)*)
    };
}

/// Create a tracing span for an import call
///
/// ```rust,ignore
/// let span = push_span!("2468", url);
/// ```
#[macro_export]
macro_rules! push_span {
    ($project_id:expr, $url:expr) => {
        tracing::info_span!("apifox_push", project_id = %$project_id, url = %$url)
    };
    ($project_id:expr, $url:expr, $($field:tt)*) => {
        tracing::info_span!("apifox_push", project_id = %$project_id, url = %$url, $($field)*)
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. A subscriber that
/// is already installed (for example by a test harness) is left in place.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })?,
    };

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    // A subscriber installed elsewhere (e.g. integration tests) stays in place.
    let _ = if config.json_logging {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    Ok(())
}
