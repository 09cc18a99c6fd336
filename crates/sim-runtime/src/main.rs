//! # Quantum-Net Simulator
//!
//! Runs a topology until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logging, metrics)
//! 2. Load configuration from the environment
//! 3. Load the topology (first CLI argument or `QN_TOPOLOGY`)
//! 4. Build and start the simulator
//! 5. Optionally start key agreement on the hosts named in `QN_QKD_HOSTS`
//! 6. Wait for Ctrl+C, stop, log an event summary and a metrics snapshot

use std::sync::Arc;

use anyhow::{Context, Result};
use qn_01_topology::TopologyDescription;
use quantum_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use shared_bus::{tally, EventFilter, InMemoryEventBus};
use sim_runtime::{SimulationConfig, Simulator};
use tracing::{info, warn};

fn topology_path() -> Option<String> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QN_TOPOLOGY").ok())
}

fn load_topology(path: &str) -> Result<TopologyDescription> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read topology file {path}"))?;
    let description = TopologyDescription::from_json(&json)
        .with_context(|| format!("cannot parse topology file {path}"))?;
    Ok(description)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("failed to initialize telemetry")?;

    let config = SimulationConfig::from_env();
    let path = topology_path()
        .context("no topology given: pass a path or set QN_TOPOLOGY")?;
    let description = load_topology(&path)?;

    let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_bus_capacity));
    let mut simulator = Simulator::build(&description, config, bus)?;
    simulator.start().await?;

    if let Ok(hosts) = std::env::var("QN_QKD_HOSTS") {
        for host in hosts.split(',').map(str::trim).filter(|h| !h.is_empty()) {
            if let Err(e) = simulator.start_qkd(host).await {
                warn!(host, error = %e, "Cannot start key agreement");
            }
        }
    }

    info!(topology = %path, "Simulation is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    simulator.stop().await?;
    let history = simulator.bus().history(&EventFilter::all());
    let mut counts: Vec<_> = tally(&history).into_iter().collect();
    counts.sort_by_key(|(event_type, _)| format!("{event_type:?}"));
    for (event_type, count) in counts {
        info!(event_type = ?event_type, count, "Event summary");
    }
    for (host, key) in simulator.keys() {
        info!(host = %host, peer = %key.peer, round = key.round, key_len = key.key.len(), "Key established");
    }
    match encode_metrics() {
        Ok(metrics) => info!("Metrics snapshot:\n{metrics}"),
        Err(e) => warn!(error = %e, "Cannot encode metrics"),
    }
    Ok(())
}
