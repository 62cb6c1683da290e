//! Telemetry Configuration

/// Logging settings, normally taken from the service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub log_level: String,
    pub json_logs: bool,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>, log_level: impl Into<String>, json_logs: bool) -> Self {
        let log_level = log_level.into();
        Self {
            service_name: service_name.into(),
            log_level: if log_level.trim().is_empty() { "info".to_string() } else { log_level },
            json_logs,
        }
    }
}
