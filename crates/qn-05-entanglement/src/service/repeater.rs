//! # Repeater Service
//!
//! Handles every qubit that reaches a quantum repeater.
//!
//! ```text
//!            memory full? ──yes──► Dropped
//!                 │no
//!  empty memory, end-host sender, repeater beyond? ──yes──► Forward
//!                 │no
//!            store (by sender)
//!                 │
//!            two stored? ──no──► Buffered
//!                 │yes
//!        Bell measurement ──► Swapped(correction to one end host)
//! ```
//!
//! Two adjacent repeaters that would each forward toward the other settle it
//! by id: only the smaller one forwards, so the halves meet at the larger.

use std::collections::HashSet;

use qn_02_quantum_state::Qubit;
use rand::Rng;
use shared_types::entities::{BellOutcome, NodeId, NodeKind};
use shared_types::messages::ControlMessage;
use tracing::{debug, info, warn};

use crate::domain::{EntanglementError, RepeaterMemory};
use crate::ports::QuantumNeighborhood;

/// Correction produced by one Bell measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionDispatch {
    /// End host that applies the correction.
    pub to: NodeId,
    pub outcome: BellOutcome,
    /// End host on the opposite side, named in the message.
    pub other: NodeId,
    /// Neighbors whose qubits were measured, in arrival order.
    pub measured: (NodeId, NodeId),
}

impl CorrectionDispatch {
    pub fn message(&self) -> ControlMessage {
        ControlMessage::EntanglementSwapCorrection {
            measurement_result: self.outcome,
            other_node_address: self.other.clone(),
        }
    }
}

#[derive(Debug)]
pub enum RepeaterAction {
    /// Pass the qubit on unmodified.
    Forward { to: NodeId, qubit: Qubit },
    /// Stored; waiting for the other half.
    Buffered { occupancy: usize },
    Swapped(CorrectionDispatch),
    /// Memory at capacity; the qubit is gone.
    Dropped(EntanglementError),
}

pub struct RepeaterService {
    node: NodeId,
    memory: RepeaterMemory,
}

impl RepeaterService {
    pub fn new(node: NodeId, num_memories: usize) -> Self {
        Self {
            memory: RepeaterMemory::new(node.clone(), num_memories),
            node,
        }
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub fn memory(&self) -> &RepeaterMemory {
        &self.memory
    }

    /// Process one incoming qubit from quantum neighbor `from`.
    ///
    /// Memory is empty again after any swap attempt, successful or not.
    pub fn on_qubit<N, R>(
        &mut self,
        qubit: Qubit,
        from: &NodeId,
        neighborhood: &N,
        rng: &mut R,
    ) -> Result<RepeaterAction, EntanglementError>
    where
        N: QuantumNeighborhood + ?Sized,
        R: Rng + ?Sized,
    {
        if self.memory.is_full() {
            warn!(
                node = %self.node,
                from = %from,
                capacity = self.memory.capacity(),
                "[qn-05] Memory full, dropping qubit"
            );
            return Ok(RepeaterAction::Dropped(EntanglementError::MemoryFull {
                node: self.node.clone(),
                capacity: self.memory.capacity(),
            }));
        }

        if self.memory.is_empty() && neighborhood.kind_of(from) == Some(NodeKind::QuantumHost) {
            if let Some(to) = self.forward_target(from, neighborhood) {
                debug!(node = %self.node, from = %from, to = %to, "[qn-05] Forwarding toward other end");
                return Ok(RepeaterAction::Forward { to, qubit });
            }
        }

        self.memory.store(from.clone(), qubit)?;
        debug!(
            node = %self.node,
            from = %from,
            occupancy = self.memory.len(),
            capacity = self.memory.capacity(),
            "[qn-05] Qubit buffered"
        );

        let Some(((first, q1), (second, q2))) = self.memory.take_pair() else {
            return Ok(RepeaterAction::Buffered {
                occupancy: self.memory.len(),
            });
        };
        // take_pair left the memory empty, so every exit below has cleared it.
        info!(node = %self.node, first = %first, second = %second, "[qn-05] Attempting swap");
        let outcome = Qubit::bell_measurement(q1, q2, rng)?;

        let end_1 = resolve_end_host(neighborhood, &self.node, &first);
        let to = resolve_end_host(neighborhood, &self.node, &second).ok_or_else(|| {
            EntanglementError::EndHostNotFound {
                repeater: self.node.clone(),
                neighbor: second.clone(),
            }
        })?;
        let other = end_1.unwrap_or_else(|| first.clone());

        info!(
            node = %self.node,
            %outcome,
            to = %to,
            other = %other,
            "[qn-05] Bell measurement performed, dispatching correction"
        );
        Ok(RepeaterAction::Swapped(CorrectionDispatch {
            to,
            outcome,
            other,
            measured: (first, second),
        }))
    }

    /// The repeater on the far side, if an end-host qubit should travel on.
    fn forward_target<N>(&self, from: &NodeId, neighborhood: &N) -> Option<NodeId>
    where
        N: QuantumNeighborhood + ?Sized,
    {
        let other = neighborhood
            .quantum_neighbors(&self.node)
            .into_iter()
            .find(|n| n != from)?;
        if neighborhood.kind_of(&other) != Some(NodeKind::QuantumRepeater) {
            return None;
        }
        // Would `other` forward its own end-host qubit to us?
        let mutual = neighborhood
            .quantum_neighbors(&other)
            .iter()
            .any(|n| *n != self.node && neighborhood.kind_of(n) == Some(NodeKind::QuantumHost));
        (!mutual || self.node < other).then_some(other)
    }
}

/// The end host reached from `repeater` through `neighbor`.
///
/// A host neighbor is its own answer; a repeater neighbor is walked outward,
/// never back toward `repeater`, until a quantum host turns up.
pub fn resolve_end_host<N>(neighborhood: &N, repeater: &NodeId, neighbor: &NodeId) -> Option<NodeId>
where
    N: QuantumNeighborhood + ?Sized,
{
    let mut visited = HashSet::from([repeater.clone()]);
    walk(neighborhood, neighbor, &mut visited)
}

fn walk<N>(neighborhood: &N, node: &NodeId, visited: &mut HashSet<NodeId>) -> Option<NodeId>
where
    N: QuantumNeighborhood + ?Sized,
{
    match neighborhood.kind_of(node)? {
        NodeKind::QuantumHost => Some(node.clone()),
        NodeKind::QuantumRepeater => {
            if !visited.insert(node.clone()) {
                return None;
            }
            for next in neighborhood.quantum_neighbors(node) {
                if visited.contains(&next) {
                    continue;
                }
                if let Some(host) = walk(neighborhood, &next, visited) {
                    return Some(host);
                }
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CorrectionRequest, EntanglementSession, PauliCorrection};
    use qn_01_topology::{Topology, TopologyBuilder};
    use qn_02_quantum_state::BellState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared_types::entities::Basis;
    use std::collections::HashMap;

    /// alice - r1 - r2 - bob
    fn daisy_chain() -> Topology {
        let desc = TopologyBuilder::new("chain")
            .quantum_network(
                "q",
                &[
                    ("alice", "QuantumHost"),
                    ("r1", "QuantumRepeater"),
                    ("r2", "QuantumRepeater"),
                    ("bob", "QuantumHost"),
                ],
            )
            .quantum_link("q", "alice", "r1", 16)
            .quantum_link("q", "r1", "r2", 16)
            .quantum_link("q", "r2", "bob", 16)
            .build();
        Topology::build(&desc).unwrap()
    }

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    /// Delivers qubits hop by hop until every repeater has acted.
    fn run_chain(
        topology: &Topology,
        injected: Vec<(NodeId, NodeId, Qubit)>,
        rng: &mut StdRng,
    ) -> Vec<CorrectionDispatch> {
        let mut repeaters: HashMap<NodeId, RepeaterService> = ["r1", "r2"]
            .into_iter()
            .map(|r| (id(r), RepeaterService::new(id(r), 2)))
            .collect();
        let mut queue = std::collections::VecDeque::from(injected);
        let mut dispatched = Vec::new();
        while let Some((to, from, qubit)) = queue.pop_front() {
            let service = repeaters.get_mut(&to).unwrap();
            match service.on_qubit(qubit, &from, topology, rng).unwrap() {
                RepeaterAction::Forward { to: next, qubit } => queue.push_back((next, to, qubit)),
                RepeaterAction::Swapped(dispatch) => dispatched.push(dispatch),
                RepeaterAction::Buffered { .. } => {}
                RepeaterAction::Dropped(err) => panic!("unexpected drop: {err}"),
            }
        }
        for service in repeaters.values() {
            assert!(service.memory().len() <= service.memory().capacity());
        }
        dispatched
    }

    #[test]
    fn test_resolve_end_host_walks_chain() {
        let topology = daisy_chain();
        assert_eq!(resolve_end_host(&topology, &id("r2"), &id("r1")), Some(id("alice")));
        assert_eq!(resolve_end_host(&topology, &id("r1"), &id("r2")), Some(id("bob")));
        assert_eq!(resolve_end_host(&topology, &id("r1"), &id("alice")), Some(id("alice")));
    }

    #[test]
    fn test_daisy_chain_one_correction_names_other_end() {
        for seed in 0..8 {
            let topology = daisy_chain();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut alice = EntanglementSession::new(id("alice"));
            let mut bob = EntanglementSession::new(id("bob"));
            let to_r1 = alice.request(id("bob"));
            let to_r2 = bob.request(id("alice"));

            // Both end-host halves reach their repeaters before either acts.
            let dispatched = run_chain(
                &topology,
                vec![(id("r1"), id("alice"), to_r1), (id("r2"), id("bob"), to_r2)],
                &mut rng,
            );
            assert_eq!(dispatched.len(), 1, "exactly one correction");
            let dispatch = &dispatched[0];
            // r1 forwards, bob's half is stored first at r2.
            assert_eq!(dispatch.measured, (id("bob"), id("r1")));
            assert_eq!(dispatch.to, id("alice"));
            assert_eq!(dispatch.other, id("bob"));

            let link = alice
                .apply_correction(
                    &CorrectionRequest {
                        measurement_result: dispatch.outcome,
                        other_node_address: dispatch.other.clone(),
                    },
                    16,
                    0.11,
                )
                .unwrap();
            assert_eq!(link.correction, PauliCorrection::from_outcome(dispatch.outcome));
            assert_eq!(link.partner, id("bob"));
            assert_eq!(bob.phase(), crate::domain::EntanglementPhase::AwaitingCorrection);
        }
    }

    #[test]
    fn test_swapped_halves_end_up_correlated() {
        let topology = daisy_chain();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mut alice = EntanglementSession::new(id("alice"));
            let mut bob = EntanglementSession::new(id("bob"));
            let to_r1 = alice.request(id("bob"));
            let to_r2 = bob.request(id("alice"));
            let dispatched = run_chain(
                &topology,
                vec![(id("r2"), id("bob"), to_r2), (id("r1"), id("alice"), to_r1)],
                &mut rng,
            );
            let dispatch = dispatched.into_iter().next().unwrap();
            alice.apply_correction(
                &CorrectionRequest {
                    measurement_result: dispatch.outcome,
                    other_node_address: dispatch.other,
                },
                16,
                0.11,
            )
            .unwrap();
            // Each retained half on its own is maximally mixed.
            let reduced = alice.retained().unwrap().reduced_state().unwrap();
            let p = reduced.basis_probabilities(Basis::Rectilinear).unwrap();
            assert!((p[0] - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn test_third_qubit_is_dropped_without_state_change() {
        let desc = TopologyBuilder::new("star")
            .quantum_network(
                "q",
                &[
                    ("a", "QuantumHost"),
                    ("b", "QuantumHost"),
                    ("c", "QuantumHost"),
                    ("rep", "QuantumRepeater"),
                ],
            )
            .quantum_link("q", "a", "rep", 8)
            .quantum_link("q", "b", "rep", 8)
            .quantum_link("q", "c", "rep", 8)
            .build();
        let topology = Topology::build(&desc).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let mut service = RepeaterService::new(id("rep"), 1);
        let q = || Qubit::prepare(Basis::Rectilinear, 0);

        assert!(matches!(
            service.on_qubit(q(), &id("a"), &topology, &mut rng).unwrap(),
            RepeaterAction::Buffered { occupancy: 1 }
        ));
        let action = service.on_qubit(q(), &id("b"), &topology, &mut rng).unwrap();
        assert!(matches!(
            action,
            RepeaterAction::Dropped(EntanglementError::MemoryFull { capacity: 1, .. })
        ));
        assert_eq!(service.memory().len(), 1);
        assert_eq!(service.memory().senders().next(), Some(&id("a")));
    }

    #[test]
    fn test_single_repeater_swaps_directly() {
        let desc = TopologyBuilder::new("one")
            .quantum_network(
                "q",
                &[("alice", "QuantumHost"), ("rep", "QuantumRepeater"), ("bob", "QuantumHost")],
            )
            .quantum_link("q", "alice", "rep", 8)
            .quantum_link("q", "rep", "bob", 8)
            .build();
        let topology = Topology::build(&desc).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut service = RepeaterService::new(id("rep"), 2);
        let (_, a) = Qubit::bell_pair(BellState::PhiPlus);
        let (_, b) = Qubit::bell_pair(BellState::PhiPlus);

        service.on_qubit(a, &id("alice"), &topology, &mut rng).unwrap();
        let RepeaterAction::Swapped(dispatch) =
            service.on_qubit(b, &id("bob"), &topology, &mut rng).unwrap()
        else {
            panic!("expected a swap");
        };
        assert_eq!(dispatch.to, id("bob"));
        assert_eq!(dispatch.other, id("alice"));
        assert!(service.memory().is_empty());
        assert!(matches!(
            dispatch.message(),
            ControlMessage::EntanglementSwapCorrection { ref other_node_address, .. }
                if *other_node_address == id("alice")
        ));
    }
}
