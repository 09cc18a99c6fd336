//! Structured logging.
//!
//! Console logs are either human-readable or JSON with consistent fields:
//! - `timestamp`, `level`, `target`
//! - `node`: Node identifier (for per-node workers)
//! - `message`: Log message
//! - Additional context fields

use tracing_subscriber::{fmt, registry::LookupSpan, Layer};

use crate::TelemetryConfig;

/// A type-erased layer over subscriber `S`.
pub type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Build the console layers selected by `config`.
///
/// Returns no layer when console output is disabled.
pub fn console_layers<S>(config: &TelemetryConfig) -> Vec<BoxedLayer<S>>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a> + Send + Sync,
{
    if !config.console_output {
        return Vec::new();
    }

    if config.json_logs {
        vec![fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()]
    } else {
        vec![fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true)
            .boxed()]
    }
}
