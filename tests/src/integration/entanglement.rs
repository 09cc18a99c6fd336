//! # Entanglement Swapping Scenarios
//!
//! ```text
//!   alice ── r1 ── bob            one swap at r1
//!   alice ── r1 ── r2 ── bob      r1 forwards, one swap at r2
//! ```
//!
//! After the swap the corrected end host runs BB84 with the far end over the
//! logical link, so both ends finish with the same key.

#[cfg(test)]
mod tests {
    use qn_01_topology::{TopologyBuilder, TopologyDescription};
    use shared_bus::EventType;
    use shared_types::entities::NodeId;

    use crate::integration::fixtures::{
        events_from, events_of, fast_config, launch, quiesce, wait_for_count, wait_until,
    };

    const SWAPPING: &str = "entanglement_swapping";

    fn single_repeater() -> TopologyDescription {
        TopologyBuilder::new("single")
            .quantum_network(
                "q",
                &[("alice", "QuantumHost"), ("r1", "QuantumRepeater"), ("bob", "QuantumHost")],
            )
            .protocol("alice", SWAPPING)
            .protocol("bob", SWAPPING)
            .quantum_link("q", "alice", "r1", 32)
            .quantum_link("q", "r1", "bob", 32)
            .build()
    }

    fn daisy_chain() -> TopologyDescription {
        TopologyBuilder::new("chain")
            .quantum_network(
                "q",
                &[
                    ("alice", "QuantumHost"),
                    ("r1", "QuantumRepeater"),
                    ("r2", "QuantumRepeater"),
                    ("bob", "QuantumHost"),
                ],
            )
            .protocol("alice", SWAPPING)
            .protocol("bob", SWAPPING)
            .quantum_link("q", "alice", "r1", 32)
            .quantum_link("q", "r1", "r2", 32)
            .quantum_link("q", "r2", "bob", 32)
            .build()
    }

    fn info_types(events: &[shared_bus::SimulationEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| e.payload["type"].as_str().map(str::to_string))
            .collect()
    }

    #[tokio::test]
    async fn test_single_repeater_swap_yields_shared_key() {
        let (mut sim, bus) = launch(&single_repeater(), fast_config(41)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdCompleted, 2).await);

        assert_eq!(events_of(&bus, EventType::RepeaterEntangled).len(), 1);
        let initialized = events_of(&bus, EventType::RepeaterEntanglementInitialized);
        assert_eq!(initialized.len(), 2);
        assert!(initialized
            .iter()
            .any(|e| e.source_node == NodeId::from("alice") && e.payload["target"] == "bob"));
        assert!(initialized
            .iter()
            .any(|e| e.source_node == NodeId::from("bob") && e.payload["target"] == "alice"));

        let alice_info = info_types(&events_from(&bus, EventType::RepeaterEntanglementInfo, "alice"));
        assert!(alice_info.contains(&"bell_state_generated".to_string()));
        assert!(alice_info.contains(&"bell_state_transferred".to_string()));

        let r1 = info_types(&events_from(&bus, EventType::RepeaterEntanglementInfo, "r1"));
        assert!(r1.contains(&"attempting_swap".to_string()));
        assert!(r1.contains(&"performed_bell_measurement".to_string()));

        let keys = sim.keys();
        let alice = &keys[&NodeId::from("alice")];
        let bob = &keys[&NodeId::from("bob")];
        assert_eq!(alice.key, bob.key);
        assert_eq!(alice.peer, NodeId::from("bob"));
        assert_eq!(bob.peer, NodeId::from("alice"));
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_daisy_chain_swaps_once_at_far_repeater() {
        let (mut sim, bus) = launch(&daisy_chain(), fast_config(43)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdCompleted, 2).await);

        let entangled = events_of(&bus, EventType::RepeaterEntangled);
        assert_eq!(entangled.len(), 1);

        let r1 = info_types(&events_from(&bus, EventType::RepeaterEntanglementInfo, "r1"));
        let r2 = info_types(&events_from(&bus, EventType::RepeaterEntanglementInfo, "r2"));
        assert!(r1.contains(&"qubit_forwarded".to_string()));
        assert!(!r1.contains(&"attempting_swap".to_string()));
        assert_eq!(r2.iter().filter(|t| *t == "attempting_swap").count(), 1);

        let keys = sim.keys();
        assert_eq!(
            keys[&NodeId::from("alice")].key,
            keys[&NodeId::from("bob")].key
        );
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_full_memory_drops_second_half() {
        let desc = TopologyBuilder::new("cramped")
            .quantum_network(
                "q",
                &[("alice", "QuantumHost"), ("r1", "QuantumRepeater"), ("bob", "QuantumHost")],
            )
            .protocol("alice", SWAPPING)
            .protocol("bob", SWAPPING)
            .memories("r1", 1)
            .quantum_link("q", "alice", "r1", 32)
            .quantum_link("q", "r1", "bob", 32)
            .build();
        let (mut sim, bus) = launch(&desc, fast_config(45)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_until(&bus, |events| {
            events.iter().any(|e| {
                e.event_type == EventType::PacketDropped && e.payload["error_type"] == "memory_full"
            })
        })
        .await);
        quiesce().await;

        let dropped = events_from(&bus, EventType::PacketDropped, "r1");
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].payload["error_type"], "memory_full");
        assert!(events_of(&bus, EventType::RepeaterEntangled).is_empty());
        assert!(sim.keys().is_empty());
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_mode_mismatch_drops_qubits() {
        let desc = TopologyBuilder::new("mismatch")
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .protocol("bob", SWAPPING)
            .quantum_link("q", "alice", "bob", 8)
            .build();
        let (mut sim, bus) = launch(&desc, fast_config(47)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::PacketDropped, 8).await);

        let dropped = events_from(&bus, EventType::PacketDropped, "bob");
        assert!(dropped
            .iter()
            .all(|e| e.payload["error_type"] == "protocol_mode_mismatch"));
        assert!(events_of(&bus, EventType::QkdCompleted).is_empty());
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_swapping_host_without_repeater_is_rejected() {
        let desc = TopologyBuilder::new("direct")
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .protocol("alice", SWAPPING)
            .protocol("bob", SWAPPING)
            .quantum_link("q", "alice", "bob", 8)
            .build();
        let (mut sim, bus) = launch(&desc, fast_config(49)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::PacketDropped, 1).await);

        let dropped = events_from(&bus, EventType::PacketDropped, "alice");
        assert_eq!(dropped[0].payload["error_type"], "protocol_violation");
        assert!(events_of(&bus, EventType::RepeaterEntanglementInitialized).is_empty());
        sim.stop().await.unwrap();
    }
}
