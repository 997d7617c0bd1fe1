//! # SDT Telemetry
//!
//! Logging and metrics shared by the sharding router crates.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sdt_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config).expect("Failed to init logging");
//!
//!     // Router events and counters are now collected
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SDT_SERVICE_NAME` | `sdt-router` | Service name in logs |
//! | `SDT_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `SDT_JSON_LOGS` | `false` | JSON log lines |
//! | `SDT_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

#![warn(missing_docs)]

mod config;
mod logging;
pub mod metrics;

pub use config::{parse_flag, TelemetryConfig, DEFAULT_SERVICE_NAME};
pub use logging::{build_filter, init_logging};
pub use metrics::{
    counter_value, gather_metrics, record_rewrite, record_rewrite_skipped, record_route,
    record_route_failure, register_metrics, RouterMetrics,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    /// Metric creation or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Convenience macro for creating a span with router context.
///
/// # Example
///
/// ```rust,ignore
/// use sdt_telemetry::router_span;
///
/// let span = router_span!("sdt_operation", group = "group01", operation_id = %id);
/// ```
#[macro_export]
macro_rules! router_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
