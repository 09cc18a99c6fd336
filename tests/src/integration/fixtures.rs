//! Shared helpers for the end-to-end scenarios.

use std::sync::Arc;
use std::time::Duration;

use qn_01_topology::TopologyDescription;
use shared_bus::{EventFilter, EventType, InMemoryEventBus, SimulationEvent};
use shared_types::entities::NodeId;
use sim_runtime::{SimulationConfig, Simulator};

/// Upper bound for any single scenario to settle.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Seeded config with a 1 ms tick.
pub fn fast_config(seed: u64) -> SimulationConfig {
    SimulationConfig {
        tick_interval: Duration::from_millis(1),
        ..SimulationConfig::default()
    }
    .with_seed(seed)
}

/// Build and start a simulator on a fresh bus.
pub async fn launch(
    desc: &TopologyDescription,
    config: SimulationConfig,
) -> (Simulator, Arc<InMemoryEventBus>) {
    let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_bus_capacity));
    let mut sim = Simulator::build(desc, config, bus.clone()).expect("topology should build");
    sim.start().await.expect("simulator should start");
    (sim, bus)
}

/// Every recorded event of `event_type`, in publish order.
pub fn events_of(bus: &InMemoryEventBus, event_type: EventType) -> Vec<SimulationEvent> {
    bus.history(&EventFilter::event_types(vec![event_type]))
}

/// Events of `event_type` published by `node`.
pub fn events_from(bus: &InMemoryEventBus, event_type: EventType, node: &str) -> Vec<SimulationEvent> {
    let node = NodeId::from(node);
    events_of(bus, event_type)
        .into_iter()
        .filter(|e| e.source_node == node)
        .collect()
}

/// Poll the history until `done` holds or [`SETTLE_TIMEOUT`] passes.
pub async fn wait_until<F>(bus: &InMemoryEventBus, mut done: F) -> bool
where
    F: FnMut(&[SimulationEvent]) -> bool,
{
    let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
    loop {
        if done(&bus.history(&EventFilter::all())) {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until at least `count` events of `event_type` are recorded.
pub async fn wait_for_count(bus: &InMemoryEventBus, event_type: EventType, count: usize) -> bool {
    wait_until(bus, |events| {
        events.iter().filter(|e| e.event_type == event_type).count() >= count
    })
    .await
}

/// Give in-flight work a few ticks to surface before asserting absence.
pub async fn quiesce() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
