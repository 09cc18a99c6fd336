//! Prometheus metrics for the simulator.
//!
//! All metrics follow the naming convention: `qn_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., qubits_transmitted_total)
//! - **Gauge**: Value that can go up or down (e.g., last observed QBER)

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHANNEL METRICS
    // =========================================================================

    /// Qubits put on a quantum channel
    pub static ref QUBITS_TRANSMITTED: Counter = Counter::new(
        "qn_channel_qubits_transmitted_total",
        "Total number of qubits transmitted over quantum channels"
    ).expect("metric creation failed");

    /// Qubits lost (repeater memory full, no channel)
    pub static ref QUBITS_DROPPED: CounterVec = CounterVec::new(
        Opts::new("qn_channel_qubits_dropped_total", "Qubits dropped before measurement"),
        &["reason"]  // reason: memory_full/no_channel/mode_mismatch
    ).expect("metric creation failed");

    // =========================================================================
    // ROUTING METRICS
    // =========================================================================

    /// Packets forwarded by routers and exchanges
    pub static ref PACKETS_ROUTED: Counter = Counter::new(
        "qn_routing_packets_routed_total",
        "Total classical packets forwarded to a next hop"
    ).expect("metric creation failed");

    /// Packets dropped during forwarding
    pub static ref PACKETS_DROPPED: CounterVec = CounterVec::new(
        Opts::new("qn_routing_packets_dropped_total", "Classical packets dropped"),
        &["reason"]  // reason: route_not_found/connection_not_found/misdirected
    ).expect("metric creation failed");

    // =========================================================================
    // QKD METRICS
    // =========================================================================

    /// BB84 rounds by outcome
    pub static ref QKD_ROUNDS: CounterVec = CounterVec::new(
        Opts::new("qn_qkd_rounds_total", "BB84 rounds by outcome"),
        &["outcome"]  // outcome: started/completed/failed
    ).expect("metric creation failed");

    /// Last QBER estimated by any host
    pub static ref LAST_QBER: Gauge = Gauge::new(
        "qn_qkd_last_error_rate",
        "Most recent sampled quantum bit error rate"
    ).expect("metric creation failed");

    // =========================================================================
    // ENTANGLEMENT METRICS
    // =========================================================================

    /// Bell-state measurements performed by repeaters
    pub static ref ENTANGLEMENT_SWAPS: Counter = Counter::new(
        "qn_entanglement_swaps_total",
        "Total Bell-state measurements performed by repeaters"
    ).expect("metric creation failed");

    // =========================================================================
    // ERROR METRICS
    // =========================================================================

    /// Node-local errors by kind
    pub static ref NODE_ERRORS: CounterVec = CounterVec::new(
        Opts::new("qn_node_errors_total", "Node-local errors caught by workers"),
        &["kind", "error_type"]
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// Registering twice is not an error; the second call is a no-op.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Channels
        Box::new(QUBITS_TRANSMITTED.clone()),
        Box::new(QUBITS_DROPPED.clone()),
        // Routing
        Box::new(PACKETS_ROUTED.clone()),
        Box::new(PACKETS_DROPPED.clone()),
        // QKD
        Box::new(QKD_ROUNDS.clone()),
        Box::new(LAST_QBER.clone()),
        // Entanglement
        Box::new(ENTANGLEMENT_SWAPS.clone()),
        // Errors
        Box::new(NODE_ERRORS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
