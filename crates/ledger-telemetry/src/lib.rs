//! # Ledger Telemetry
//!
//! Structured logging for ledger query services, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("Failed to init telemetry");
//!     // Query events from `ledger-query` are now written to stdout
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LQ_SERVICE_NAME` | `ledger-query` | Service name in log output |
//! | `LQ_LOG_LEVEL` | `info` | Log level filter, falls back to `RUST_LOG` |
//! | `LQ_CONSOLE_OUTPUT` | `true` | Write events to stdout |
//! | `LQ_JSON_LOGS` | `false` | One JSON object per event |

mod config;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use tracing_setup::build_filter;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global `tracing` subscriber described by `config`.
///
/// Fails with [`TelemetryError::AlreadyInitialized`] when another subscriber
/// is already installed.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_setup::init_tracing(config)
}

/// Like [`init_telemetry`], but a second call is not an error.
///
/// Test binaries call this from every test.
pub fn try_init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    match init_telemetry(config) {
        Err(TelemetryError::AlreadyInitialized(_)) => Ok(()),
        other => other,
    }
}
