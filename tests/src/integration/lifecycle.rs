//! Start/stop behaviour of a running simulator.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use qn_01_topology::TopologyBuilder;
    use shared_bus::{EventFilter, EventTopic, EventType};
    use shared_types::errors::SimulationError;

    use crate::integration::fixtures::{events_of, fast_config, launch, wait_for_count};

    #[tokio::test]
    async fn test_stop_joins_workers_and_closes_inboxes() {
        let desc = TopologyBuilder::new("line")
            .classical_network("net", &[("h1", "ClassicalHost"), ("h2", "ClassicalHost")])
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .link("net", "h1", "h2")
            .quantum_link("q", "alice", "bob", 16)
            .build();
        let (mut sim, bus) = launch(&desc, fast_config(61)).await;
        sim.send_message("h1", "h2", "before stop").unwrap();
        assert!(wait_for_count(&bus, EventType::DataReceived, 1).await);

        tokio::time::timeout(Duration::from_secs(5), sim.stop())
            .await
            .expect("workers did not stop")
            .unwrap();
        assert!(!sim.is_running());
        assert_eq!(events_of(&bus, EventType::SimulationStopped).len(), 1);

        match sim.send_message("h1", "h2", "after stop") {
            Err(SimulationError::DeliveryFailed { reason, .. }) => assert_eq!(reason, "inbox closed"),
            other => panic!("expected a closed inbox, got {other:?}"),
        }
        assert!(matches!(
            sim.start_qkd("alice").await,
            Err(SimulationError::DeliveryFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_dropping_a_running_simulator_stops_workers() {
        let desc = TopologyBuilder::new("solo")
            .classical_network("net", &[("h1", "ClassicalHost")])
            .build();
        let (sim, bus) = launch(&desc, fast_config(63)).await;
        drop(sim);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(events_of(&bus, EventType::SimulationStarted).len(), 1);
        assert!(events_of(&bus, EventType::SimulationStopped).is_empty());
    }

    #[tokio::test]
    async fn test_late_follower_sees_whole_stream_in_order() {
        let desc = TopologyBuilder::new("pair")
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .quantum_link("q", "alice", "bob", 32)
            .build();
        let (mut sim, bus) = launch(&desc, fast_config(65)).await;
        sim.start_qkd("alice").await.unwrap();
        assert!(wait_for_count(&bus, EventType::QkdCompleted, 2).await);

        let mut follower = bus.follow(EventFilter::topics(vec![EventTopic::Lifecycle, EventTopic::Qkd]));
        sim.stop().await.unwrap();

        let mut seen = Vec::new();
        while let Ok(Some(event)) = follower.try_recv() {
            seen.push(event);
        }
        assert!(seen.windows(2).all(|w| w[0].sequence < w[1].sequence));
        assert_eq!(seen.first().map(|e| e.event_type), Some(EventType::SimulationStarted));
        assert_eq!(seen.last().map(|e| e.event_type), Some(EventType::SimulationStopped));
        assert_eq!(
            seen.iter()
                .filter(|e| e.event_type == EventType::QkdCompleted)
                .count(),
            2
        );
        assert_eq!(follower.missed(), 0);
    }
}
