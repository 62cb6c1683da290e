//! Voxpool Telemetry
//!
//! Structured logging setup and lightweight in-process counters.

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{Counter, CounterSnapshot};
pub use tracing_setup::init_tracing;

/// Initialize all telemetry for a service
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    init_tracing(config)
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}
