//! # Classical Routing Scenarios
//!
//! Packets travel hop by hop over classical connections, always along the
//! breadth-first shortest path, and an adapter reached by a packet starts
//! key agreement on its quantum host.

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet, VecDeque};

    use qn_01_topology::{Topology, TopologyBuilder, TopologyDescription};
    use qn_06_routing::RouteTable;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use serde_json::Value;
    use shared_bus::{EventLevel, EventType};
    use shared_types::entities::NodeId;

    use crate::integration::fixtures::{events_from, events_of, fast_config, launch, wait_for_count};

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// h1 - r1 - ix - r2 - h2 with a shortcut r1 - r2, plus an unlinked h3.
    fn campus() -> TopologyDescription {
        TopologyBuilder::new("campus")
            .classical_network(
                "net",
                &[
                    ("h1", "ClassicalHost"),
                    ("r1", "ClassicalRouter"),
                    ("ix", "InternetExchange"),
                    ("r2", "ClassicalRouter"),
                    ("h2", "ClassicalHost"),
                    ("h3", "ClassicalHost"),
                ],
            )
            .link("net", "h1", "r1")
            .link("net", "r1", "ix")
            .link("net", "ix", "r2")
            .link("net", "r2", "h2")
            .link("net", "r1", "r2")
            .build()
    }

    fn hops(payload: &Value) -> Vec<String> {
        payload["hops"]
            .as_array()
            .map(|hops| {
                hops.iter()
                    .filter_map(|h| h.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Reference breadth-first distance over an edge list.
    fn bfs_distance(edges: &[(String, String)], from: &str, to: &str) -> Option<usize> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for (a, b) in edges {
            adjacency.entry(a.as_str()).or_default().push(b.as_str());
            adjacency.entry(b.as_str()).or_default().push(a.as_str());
        }
        let mut seen = HashSet::from([from]);
        let mut queue = VecDeque::from([(from, 0)]);
        while let Some((node, dist)) = queue.pop_front() {
            if node == to {
                return Some(dist);
            }
            for &next in adjacency.get(node).into_iter().flatten() {
                if seen.insert(next) {
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }

    // =========================================================================
    // FORWARDING
    // =========================================================================

    #[tokio::test]
    async fn test_packet_follows_shortest_path() {
        let (mut sim, bus) = launch(&campus(), fast_config(1)).await;
        sim.send_message("h1", "h2", "hello").unwrap();
        assert!(wait_for_count(&bus, EventType::PacketDelivered, 1).await);

        let delivered = events_of(&bus, EventType::PacketDelivered);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].source_node, NodeId::from("h2"));

        let expected: Vec<String> = sim
            .world()
            .routes()
            .get_path(&NodeId::from("h1"), &NodeId::from("h2"))
            .unwrap()
            .iter()
            .map(|n| n.as_str().to_string())
            .collect();
        assert_eq!(hops(&delivered[0].payload), expected);
        assert_eq!(expected, vec!["h1", "r1", "r2", "h2"]);

        assert_eq!(events_from(&bus, EventType::DataSent, "h1").len(), 1);
        assert_eq!(events_from(&bus, EventType::PacketTransmitted, "h1").len(), 1);
        assert_eq!(events_from(&bus, EventType::PacketRouted, "r1").len(), 1);
        assert_eq!(events_from(&bus, EventType::PacketRouted, "r2").len(), 1);
        assert!(events_from(&bus, EventType::PacketRouted, "ix").is_empty());

        let received = events_from(&bus, EventType::DataReceived, "h2");
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].payload["payload"], "hello");
        sim.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_destination_reports_routing_error() {
        let (mut sim, bus) = launch(&campus(), fast_config(2)).await;
        sim.send_message("h1", "h3", "anyone?").unwrap();
        assert!(wait_for_count(&bus, EventType::RoutingError, 1).await);

        let errors = events_from(&bus, EventType::RoutingError, "h1");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].level, EventLevel::Warning);
        assert!(events_of(&bus, EventType::PacketDelivered).is_empty());
        sim.stop().await.unwrap();
    }

    #[test]
    fn test_random_graphs_route_along_bfs_distance() {
        let mut rng = StdRng::seed_from_u64(42);
        for round in 0..8 {
            let names: Vec<String> = (0..10).map(|i| format!("n{i}")).collect();
            let hosts: Vec<(&str, &str)> =
                names.iter().map(|n| (n.as_str(), "ClassicalRouter")).collect();
            let mut builder = TopologyBuilder::new(&format!("random-{round}")).classical_network("net", &hosts);
            let mut edges = Vec::new();
            for (i, a) in names.iter().enumerate() {
                for b in &names[i + 1..] {
                    if rng.gen_bool(0.25) {
                        builder = builder.link("net", a, b);
                        edges.push((a.clone(), b.clone()));
                    }
                }
            }
            let topology = Topology::build(&builder.build()).unwrap();
            let table = RouteTable::from_topology(&topology);
            let linked: HashSet<(&str, &str)> = edges
                .iter()
                .flat_map(|(a, b)| [(a.as_str(), b.as_str()), (b.as_str(), a.as_str())])
                .collect();

            for a in &names {
                for b in &names {
                    let expected = bfs_distance(&edges, a, b);
                    match table.get_path(&NodeId::from(a.as_str()), &NodeId::from(b.as_str())) {
                        Ok(path) => {
                            assert_eq!(path.first().map(NodeId::as_str), Some(a.as_str()));
                            assert_eq!(path.last().map(NodeId::as_str), Some(b.as_str()));
                            assert_eq!(Some(path.len() - 1), expected, "{a} -> {b}");
                            for pair in path.windows(2) {
                                assert!(linked.contains(&(pair[0].as_str(), pair[1].as_str())));
                            }
                        }
                        // Isolated nodes have no entry at all.
                        Err(_) => assert!(expected.is_none() || a == b, "{a} -> {b}"),
                    }
                }
            }
        }
    }

    // =========================================================================
    // ADAPTERS
    // =========================================================================

    #[tokio::test]
    async fn test_packet_to_adapter_starts_qkd() {
        let desc = TopologyBuilder::new("bridge")
            .classical_network(
                "net",
                &[("h1", "ClassicalHost"), ("ix", "InternetExchange"), ("h2", "ClassicalHost")],
            )
            .quantum_network("q", &[("alice", "QuantumHost"), ("bob", "QuantumHost")])
            .link("net", "h1", "ix")
            .link("net", "ix", "h2")
            .quantum_link("q", "alice", "bob", 64)
            .adapter("ad1", "alice", "h2", "net", "q")
            .build();
        let (mut sim, bus) = launch(&desc, fast_config(3)).await;
        sim.send_message("h1", "ad1", "start key exchange").unwrap();
        assert!(wait_for_count(&bus, EventType::QkdCompleted, 2).await);

        let delivered = events_from(&bus, EventType::PacketDelivered, "ad1");
        assert_eq!(delivered.len(), 1);
        assert_eq!(hops(&delivered[0].payload), vec!["h1", "ix", "h2", "ad1"]);

        let initiated = events_from(&bus, EventType::QkdInitiated, "ad1");
        assert_eq!(initiated.len(), 1);
        assert_eq!(initiated[0].payload["quantum_host"], "alice");
        assert_eq!(initiated[0].payload["trigger"], "adapter");

        let keys = sim.keys();
        let alice = &keys[&NodeId::from("alice")];
        let bob = &keys[&NodeId::from("bob")];
        assert_eq!(alice.key, bob.key);
        assert_eq!(alice.peer, NodeId::from("bob"));
        sim.stop().await.unwrap();
    }
}
