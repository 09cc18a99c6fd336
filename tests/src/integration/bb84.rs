//! # BB84 Scenarios
//!
//! Key agreement between two quantum hosts over a direct channel, through an
//! intercept-resend relay, and over a channel too noisy to pass the error
//! threshold.

#[cfg(test)]
mod tests {
    use qn_01_topology::{ConnectionDescription, TopologyBuilder, TopologyDescription};
    use shared_bus::{EventLevel, EventType};
    use shared_types::entities::NodeId;
    use sim_runtime::SimulationConfig;

    use crate::integration::fixtures::{
        events_from, events_of, fast_config, launch, quiesce, wait_for_count,
    };

    fn pair(num_bits: usize) -> TopologyDescription {
        TopologyBuilder::new("pair")
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .quantum_link("q", "alice", "bob", num_bits)
            .build()
    }

    /// alice - bob over a channel that flips every qubit, with zero tolerance.
    fn flipping_pair(num_bits: usize) -> TopologyDescription {
        TopologyBuilder::new("flipping")
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .connection(
                "q",
                ConnectionDescription {
                    noise_model: "bit_flip".to_string(),
                    noise_strength: 1.0,
                    error_rate_threshold: 0.0,
                    ..ConnectionDescription::quantum("alice", "bob", num_bits)
                },
            )
            .build()
    }

    /// alice - eve - bob, where eve measures and resends every qubit.
    fn eavesdropped(num_bits: usize, threshold: f64) -> TopologyDescription {
        TopologyBuilder::new("eavesdropped")
            .quantum_network(
                "q",
                &[("alice", "QuantumHost"), ("eve", "QuantumHost"), ("bob", "QuantumHost")],
            )
            .connection(
                "q",
                ConnectionDescription {
                    error_rate_threshold: threshold,
                    ..ConnectionDescription::quantum("alice", "eve", num_bits)
                },
            )
            .connection(
                "q",
                ConnectionDescription {
                    error_rate_threshold: threshold,
                    ..ConnectionDescription::quantum("eve", "bob", num_bits)
                },
            )
            .build()
    }

    // =========================================================================
    // DIRECT CHANNEL
    // =========================================================================

    #[tokio::test]
    async fn test_noiseless_round_agrees_on_key() {
        let (mut sim, bus) = launch(&pair(64), fast_config(11)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdCompleted, 2).await);

        let keys = sim.keys();
        let alice = &keys[&NodeId::from("alice")];
        let bob = &keys[&NodeId::from("bob")];
        assert!(!alice.key.is_empty());
        assert!(alice.key.len() <= 64);
        assert_eq!(alice.key, bob.key);
        assert_eq!(alice.error_rate, Some(0.0));
        assert_eq!(alice.peer, NodeId::from("bob"));
        assert_eq!(bob.peer, NodeId::from("alice"));

        let started = events_from(&bus, EventType::TransmissionStarted, "alice");
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].payload["num_bits"], 64);
        assert!(events_of(&bus, EventType::PacketCorrupted).is_empty());
        assert!(events_of(&bus, EventType::QkdFailed).is_empty());

        let initiated = events_from(&bus, EventType::QkdInitiated, "alice");
        assert_eq!(initiated.len(), 1);
        assert_eq!(initiated[0].payload["trigger"], "command");
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_same_seed_replays_same_key() {
        let desc = pair(48);
        let reloaded = TopologyDescription::from_json(&desc.to_json().unwrap()).unwrap();

        let mut keys = Vec::new();
        for topology in [&desc, &reloaded] {
            let (mut sim, bus) = launch(topology, fast_config(99)).await;
            sim.start_qkd("alice").await.unwrap();
            assert!(wait_for_count(&bus, EventType::QkdCompleted, 2).await);
            keys.push(sim.keys()[&NodeId::from("alice")].key.clone());
            sim.stop().await.unwrap();
        }
        assert_eq!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn test_start_qkd_rejects_non_hosts() {
        let desc = TopologyBuilder::new("mixed")
            .classical_network("net", &[("h1", "ClassicalHost")])
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .quantum_link("q", "alice", "bob", 8)
            .build();
        let (mut sim, _bus) = launch(&desc, fast_config(5)).await;
        assert!(sim.start_qkd("h1").await.is_err());
        assert!(sim.start_qkd("nobody").await.is_err());
        sim.stop().await.unwrap();
    }

    // =========================================================================
    // ERROR THRESHOLD
    // =========================================================================

    #[tokio::test]
    async fn test_noisy_channel_fails_round() {
        let (mut sim, bus) = launch(&flipping_pair(2000), fast_config(21)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdFailed, 1).await);
        quiesce().await;

        let failed = events_of(&bus, EventType::QkdFailed);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source_node, NodeId::from("alice"));
        assert_eq!(failed[0].level, EventLevel::Warning);
        let rate = failed[0].payload["error_rate"].as_f64().unwrap();
        assert!(rate > 0.0);
        assert!(sim.keys().is_empty());
        assert!(!events_from(&bus, EventType::PacketCorrupted, "alice").is_empty());

        // A manual retry runs a fresh round over the same channel.
        sim.retry_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdFailed, 2).await);
        assert_eq!(
            events_from(&bus, EventType::TransmissionStarted, "alice").len(),
            2
        );
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_auto_retry_stops_at_limit() {
        let config = SimulationConfig {
            auto_retry_qkd: true,
            max_qkd_retries: 2,
            ..fast_config(23)
        };
        let (mut sim, bus) = launch(&flipping_pair(2000), config).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdFailed, 3).await);
        quiesce().await;

        assert_eq!(events_of(&bus, EventType::QkdFailed).len(), 3);
        let retries: Vec<_> = events_from(&bus, EventType::QkdInitiated, "alice")
            .into_iter()
            .filter(|e| e.payload["trigger"] == "auto_retry")
            .collect();
        assert_eq!(retries.len(), 2);
        assert_eq!(retries[1].payload["attempt"], 2);
        sim.stop().await.unwrap();
    }

    // =========================================================================
    // EAVESDROPPING
    // =========================================================================

    #[tokio::test]
    async fn test_intercept_resend_disturbs_key() {
        // A threshold of 1.0 lets the round finish so both keys can be compared.
        let (mut sim, bus) = launch(&eavesdropped(400, 1.0), fast_config(31)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdCompleted, 2).await);

        let keys = sim.keys();
        assert!(!keys.contains_key(&NodeId::from("eve")));
        let alice = &keys[&NodeId::from("alice")];
        let bob = &keys[&NodeId::from("bob")];
        assert_eq!(alice.peer, NodeId::from("bob"));
        assert_eq!(bob.peer, NodeId::from("alice"));
        assert_eq!(alice.key.len(), bob.key.len());

        let mismatched = alice
            .key
            .iter()
            .zip(&bob.key)
            .filter(|(a, b)| a != b)
            .count();
        let fraction = mismatched as f64 / alice.key.len() as f64;
        assert!((0.1..0.4).contains(&fraction), "mismatch fraction {fraction}");
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_relay_cannot_initiate() {
        let (mut sim, bus) = launch(&eavesdropped(16, 0.11), fast_config(33)).await;
        sim.start_qkd("eve").await.unwrap();
        assert!(wait_for_count(&bus, EventType::PacketDropped, 1).await);

        let dropped = events_from(&bus, EventType::PacketDropped, "eve");
        assert_eq!(dropped[0].payload["error_type"], "protocol_violation");
        assert!(events_of(&bus, EventType::TransmissionStarted).is_empty());
        sim.stop().await.unwrap();
    }
}
