//! Logging setup for the postern tools.
//!
//! # Usage
//!
//! ```ignore
//! use postern_telemetry::{Telemetry, TelemetryConfig};
//!
//! let telemetry = Telemetry::init(TelemetryConfig::new().with_log_level("debug"))?;
//! ```

pub mod config;
pub mod logging;

pub use config::{LogFormat, LogTarget, TelemetryConfig};
pub use logging::events;

use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Telemetry handle.
#[derive(Debug)]
pub struct Telemetry {
    config: TelemetryConfig,
}

impl Telemetry {
    /// Install the global subscriber.
    pub fn init(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        logging::init_logging(&config)?;
        Ok(Self { config })
    }

    /// Get the telemetry configuration.
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "postern");
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_target, LogTarget::Stderr);
    }

    #[test]
    fn test_config_builder() {
        let config = TelemetryConfig::new()
            .with_service_name("routes-check")
            .with_log_level("debug")
            .with_log_format(LogFormat::Pretty)
            .with_log_target(LogTarget::Stdout);

        assert_eq!(config.service_name, "routes-check");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.log_target, LogTarget::Stdout);
    }
}
