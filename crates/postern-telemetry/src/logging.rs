//! Structured logging with JSON or pretty output.

use crate::{LogFormat, LogTarget, TelemetryConfig, TelemetryError};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging subsystem.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Json => init_json_logging(filter, config.log_target),
        LogFormat::Pretty => init_pretty_logging(filter, config.log_target),
    }
}

fn writer(target: LogTarget) -> BoxMakeWriter {
    match target {
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
    }
}

fn init_json_logging(filter: EnvFilter, target: LogTarget) -> Result<(), TelemetryError> {
    let json_layer = fmt::layer()
        .json()
        .with_writer(writer(target))
        .with_target(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_file(false)
        .with_line_number(false)
        .flatten_event(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(json_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

fn init_pretty_logging(filter: EnvFilter, target: LogTarget) -> Result<(), TelemetryError> {
    let pretty_layer = fmt::layer()
        .pretty()
        .with_writer(writer(target))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(pretty_layer)
        .try_init()
        .map_err(|e: tracing_subscriber::util::TryInitError| {
            TelemetryError::LoggingInit(e.to_string())
        })
}

/// Standard log event names.
pub mod events {
    /// A route manifest has been loaded into a table.
    pub const ROUTES_LOADED: &str = "routes_loaded";

    /// The default routes have been generated.
    pub const DEFAULT_ROUTES_CONNECTED: &str = "default_routes_connected";

    /// A path matched a route.
    pub const ROUTE_MATCHED: &str = "route_matched";

    /// No route matched a path.
    pub const ROUTE_NOT_MATCHED: &str = "route_not_matched";

    /// A route declaration was rejected.
    pub const ROUTE_REJECTED: &str = "route_rejected";

    /// A URL was generated.
    pub const URL_GENERATED: &str = "url_generated";
}

#[macro_export]
macro_rules! log_routes_loaded {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTES_LOADED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_default_routes_connected {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::DEFAULT_ROUTES_CONNECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_matched {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::ROUTE_MATCHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_not_matched {
    ($($field:tt)*) => {
        tracing::info!(
            event = $crate::logging::events::ROUTE_NOT_MATCHED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_route_rejected {
    ($($field:tt)*) => {
        tracing::warn!(
            event = $crate::logging::events::ROUTE_REJECTED,
            $($field)*
        )
    };
}

#[macro_export]
macro_rules! log_url_generated {
    ($($field:tt)*) => {
        tracing::debug!(
            event = $crate::logging::events::URL_GENERATED,
            $($field)*
        )
    };
}
