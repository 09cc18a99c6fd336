//! # End-host side of entanglement swapping
//!
//! ```text
//! Idle ──request(target)──► AwaitingCorrection ──apply_correction──► Ready
//!   └────────────────────────accept_link(partner)───────────────────► Ready
//! ```
//!
//! `Ready` means a logical entangled channel exists and replaces the physical
//! channel as the transport for the next key-agreement round.

use qn_02_quantum_state::{BellState, Qubit};
use qn_03_channels::QuantumChannel;
use serde::{Deserialize, Serialize};
use shared_types::entities::{BellOutcome, NodeId};
use tracing::{info, warn};

use super::correction::PauliCorrection;
use super::errors::EntanglementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntanglementPhase {
    Idle,
    AwaitingCorrection,
    Ready,
}

/// A correction as delivered by a repeater.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionRequest {
    pub measurement_result: BellOutcome,
    pub other_node_address: NodeId,
}

/// Produced by a successful correction.
#[derive(Debug, Clone)]
pub struct EstablishedLink {
    pub partner: NodeId,
    pub correction: PauliCorrection,
    pub channel: QuantumChannel,
}

#[derive(Debug, Clone)]
pub struct EntanglementSession {
    node: NodeId,
    phase: EntanglementPhase,
    retained: Option<Qubit>,
    partner: Option<NodeId>,
    link: Option<QuantumChannel>,
}

impl EntanglementSession {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            phase: EntanglementPhase::Idle,
            retained: None,
            partner: None,
            link: None,
        }
    }

    pub fn phase(&self) -> EntanglementPhase {
        self.phase
    }

    /// Partner of the handshake in flight.
    pub fn partner(&self) -> Option<&NodeId> {
        self.partner.as_ref()
    }

    /// Locally held half of the pair (corrected once the swap succeeded).
    pub fn retained(&self) -> Option<&Qubit> {
        self.retained.as_ref()
    }

    /// The logical channel, once established.
    pub fn link(&self) -> Option<&QuantumChannel> {
        self.link.as_ref()
    }

    /// Generate `|Φ+⟩`, keep qubit 0 and return qubit 1 for transmission.
    ///
    /// A handshake already in flight is abandoned.
    pub fn request(&mut self, target: NodeId) -> Qubit {
        let (keep, send) = Qubit::bell_pair(BellState::PhiPlus);
        info!(node = %self.node, target = %target, "[qn-05] Requesting entanglement");
        self.retained = Some(keep);
        self.partner = Some(target);
        self.phase = EntanglementPhase::AwaitingCorrection;
        send
    }

    /// Apply a repeater's correction and materialize the logical channel.
    ///
    /// A correction naming someone other than the pending partner is rejected
    /// with no state change.
    pub fn apply_correction(
        &mut self,
        request: &CorrectionRequest,
        num_bits: usize,
        error_rate_threshold: f64,
    ) -> Result<EstablishedLink, EntanglementError> {
        if self.partner.as_ref() != Some(&request.other_node_address) {
            warn!(
                node = %self.node,
                expected = ?self.partner,
                received = %request.other_node_address,
                "[qn-05] Correction for a different partner, discarded"
            );
            return Err(EntanglementError::StaleHandshake {
                node: self.node.clone(),
                expected: self.partner.clone(),
                received: request.other_node_address.clone(),
            });
        }
        let qubit = self
            .retained
            .as_mut()
            .ok_or_else(|| EntanglementError::NoStoredQubit(self.node.clone()))?;

        let correction = PauliCorrection::from_outcome(request.measurement_result);
        qubit.apply_unitary(&correction.operator()?)?;

        let partner = request.other_node_address.clone();
        let channel = QuantumChannel::entangled(
            self.node.clone(),
            partner.clone(),
            num_bits,
            error_rate_threshold,
        );
        self.partner = None;
        self.link = Some(channel.clone());
        self.phase = EntanglementPhase::Ready;
        info!(
            node = %self.node,
            partner = %partner,
            %correction,
            "[qn-05] Correction applied, entanglement established"
        );
        Ok(EstablishedLink {
            partner,
            correction,
            channel,
        })
    }

    /// Passive end: the corrected partner announced the logical channel.
    pub fn accept_link(
        &mut self,
        partner: NodeId,
        num_bits: usize,
        error_rate_threshold: f64,
    ) -> &QuantumChannel {
        info!(node = %self.node, partner = %partner, "[qn-05] Entangled channel accepted");
        self.partner = None;
        self.phase = EntanglementPhase::Ready;
        self.link.insert(QuantumChannel::entangled(
            partner,
            self.node.clone(),
            num_bits,
            error_rate_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qn_02_quantum_state::{Ket, Operator};

    fn request(m: (u8, u8), other: &str) -> CorrectionRequest {
        CorrectionRequest {
            measurement_result: BellOutcome(m.0, m.1),
            other_node_address: other.into(),
        }
    }

    #[test]
    fn test_request_keeps_half_and_awaits() {
        let mut alice = EntanglementSession::new("alice".into());
        let sent = alice.request("bob".into());
        assert_eq!(alice.phase(), EntanglementPhase::AwaitingCorrection);
        assert_eq!(alice.partner(), Some(&NodeId::from("bob")));
        assert_eq!(alice.retained().unwrap().pair_id(), sent.pair_id());
    }

    #[test]
    fn test_stale_correction_changes_nothing() {
        let mut alice = EntanglementSession::new("alice".into());
        alice.request("bob".into());
        let before = alice.retained().cloned();

        let err = alice
            .apply_correction(&request((0, 1), "carol"), 16, 0.11)
            .unwrap_err();
        assert!(matches!(err, EntanglementError::StaleHandshake { .. }));
        assert_eq!(alice.phase(), EntanglementPhase::AwaitingCorrection);
        assert_eq!(alice.retained().cloned(), before);
        assert!(alice.link().is_none());
    }

    #[test]
    fn test_correction_without_request_is_stale() {
        let mut alice = EntanglementSession::new("alice".into());
        let err = alice
            .apply_correction(&request((0, 0), "bob"), 16, 0.11)
            .unwrap_err();
        assert_eq!(
            err,
            EntanglementError::StaleHandshake {
                node: "alice".into(),
                expected: None,
                received: "bob".into()
            }
        );
    }

    #[test]
    fn test_each_outcome_applies_its_pauli() {
        for (m, op) in [
            ((0, 0), Operator::identity(2)),
            ((0, 1), Operator::pauli_x()),
            ((1, 0), Operator::pauli_z()),
            ((1, 1), Operator::pauli_x().mul(&Operator::pauli_z()).unwrap()),
        ] {
            let mut alice = EntanglementSession::new("alice".into());
            alice.request("bob".into());
            let (mut reference, _) = Qubit::bell_pair(BellState::PhiPlus);
            reference.apply_unitary(&op).unwrap();

            let link = alice.apply_correction(&request(m, "bob"), 16, 0.11).unwrap();
            assert_eq!(link.correction, PauliCorrection::from_outcome(BellOutcome(m.0, m.1)));
            assert_eq!(link.channel.num_bits, 16);
            assert!(link.channel.logical);
            assert_eq!(alice.phase(), EntanglementPhase::Ready);
            assert_eq!(alice.partner(), None);

            let got = alice.retained().unwrap().reduced_state().unwrap();
            let want = reference.reduced_state().unwrap();
            for ket in [Ket::zero(), Ket::one(), Ket::plus(), Ket::minus()] {
                let (g, w) = (got.probability_of(&ket).unwrap(), want.probability_of(&ket).unwrap());
                assert!((g - w).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_accept_link_makes_passive_end_ready() {
        let mut bob = EntanglementSession::new("bob".into());
        let channel = bob.accept_link("alice".into(), 32, 0.11).clone();
        assert!(channel.connects(&"alice".into(), &"bob".into()));
        assert_eq!(bob.phase(), EntanglementPhase::Ready);
        assert_eq!(bob.link(), Some(&channel));
    }
}
