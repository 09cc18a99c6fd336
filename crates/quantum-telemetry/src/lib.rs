//! # Quantum Telemetry
//!
//! Observability for the Quantum-Net simulator.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` console output, pretty or JSON
//! - **Metrics**: Prometheus counters and gauges for channels, routing,
//!   key distribution and repeaters
//! - **Traces**: OpenTelemetry OTLP export (`otlp` feature)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("Failed to init telemetry");
//!
//!     // Simulation runs here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | `http://localhost:4317` | OTLP endpoint |
//! | `OTEL_SERVICE_NAME` | `quantum-net` | Service name in traces |
//! | `QN_OTLP_ENABLED` | `false` | Export spans |
//! | `QN_LOG_LEVEL` | `info` | Log level filter |
//! | `QN_JSON_LOGS` | `false` | JSON console logs |
//! | `QN_CONSOLE_OUTPUT` | `true` | Console logs at all |

mod config;
mod logging;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use logging::{console_layers, BoxedLayer};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, ENTANGLEMENT_SWAPS, LAST_QBER,
    NODE_ERRORS, PACKETS_DROPPED, PACKETS_ROUTED, QKD_ROUNDS, QUBITS_DROPPED, QUBITS_TRANSMITTED,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracer: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging, metrics and (optionally) trace export.
///
/// Returns a guard that must be held for the lifetime of the application.
/// When dropped, it flushes pending spans.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first, they never depend on the subscriber
    let metrics_handle = register_metrics()?;

    let tracing_guard = tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        _tracing: tracing_guard,
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to flush and shutdown.
pub struct TelemetryGuard {
    _tracing: TracingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for creating a span with node context.
///
/// ```rust,ignore
/// let _span = quantum_telemetry::node_span!("bb84_round", node = %id, round = 2);
/// ```
#[macro_export]
macro_rules! node_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
