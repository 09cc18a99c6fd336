//! # BB84 Session
//!
//! Sans-IO state machine for one host's side of a key-agreement round. The
//! caller moves qubits and control messages; the session decides what to
//! send next.
//!
//! ```text
//! initiator: Idle ─begin─► Sending ─► AwaitingBases ─► AwaitingErrorSample ─┬─► Complete
//!                                                                          └─► Retry
//! responder: Idle ─qubit─► Receiving ─► AwaitingSharedIndices ─► AwaitingVerdict ─┬─► Complete
//!                                                                                └─► Retry
//! ```

use qn_02_quantum_state::Qubit;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared_types::entities::{Basis, Bit, NodeId};
use shared_types::messages::{ControlMessage, SampledBit};
use tracing::{debug, info, warn};

use super::errors::Bb84Error;
use super::sifting::{self, BasisRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bb84Phase {
    Idle,
    Sending,
    Receiving,
    AwaitingBases,
    AwaitingSharedIndices,
    AwaitingErrorSample,
    AwaitingVerdict,
    Complete,
    Retry,
}

impl Bb84Phase {
    /// No round in flight.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Idle | Self::Complete | Self::Retry)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bb84Role {
    Initiator,
    Responder,
}

/// How a round ended, as seen by this host.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// Key extracted. The error rate is known only on the deciding side.
    Completed {
        key: Vec<Bit>,
        error_rate: Option<f64>,
    },
    Failed {
        error_rate: f64,
    },
}

/// Result of feeding one control message to the session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bb84Step {
    pub reply: Option<ControlMessage>,
    pub outcome: Option<RoundOutcome>,
}

#[derive(Debug, Clone)]
pub struct Bb84Session {
    node: NodeId,
    phase: Bb84Phase,
    role: Option<Bb84Role>,
    peer: Option<NodeId>,
    records: Vec<BasisRecord>,
    shared_indices: Vec<usize>,
    num_bits: usize,
    threshold: f64,
    round: u32,
    error_rate: Option<f64>,
}

impl Bb84Session {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            phase: Bb84Phase::Idle,
            role: None,
            peer: None,
            records: Vec::new(),
            shared_indices: Vec::new(),
            num_bits: 0,
            threshold: 0.0,
            round: 0,
            error_rate: None,
        }
    }

    pub fn node(&self) -> &NodeId {
        &self.node
    }

    pub fn phase(&self) -> Bb84Phase {
        self.phase
    }

    pub fn role(&self) -> Option<Bb84Role> {
        self.role
    }

    pub fn peer(&self) -> Option<&NodeId> {
        self.peer.as_ref()
    }

    pub fn records(&self) -> &[BasisRecord] {
        &self.records
    }

    pub fn shared_indices(&self) -> &[usize] {
        &self.shared_indices
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Last error rate this host computed or was told about.
    pub fn error_rate(&self) -> Option<f64> {
        self.error_rate
    }

    /// Drop all round state; the round counter is kept.
    pub fn reset(&mut self) {
        self.phase = Bb84Phase::Idle;
        self.role = None;
        self.peer = None;
        self.records.clear();
        self.shared_indices.clear();
        self.error_rate = None;
    }

    fn start_round(&mut self, role: Bb84Role, peer: NodeId, num_bits: usize, threshold: f64) {
        self.reset();
        self.round += 1;
        self.role = Some(role);
        self.peer = Some(peer);
        self.num_bits = num_bits;
        self.threshold = threshold;
    }

    // =========================================================================
    // INITIATOR
    // =========================================================================

    /// Start a round toward `peer`: draw a basis and bit per qubit and prepare them.
    ///
    /// Any round in flight is abandoned.
    pub fn begin_sending<R: Rng + ?Sized>(
        &mut self,
        peer: NodeId,
        num_bits: usize,
        threshold: f64,
        rng: &mut R,
    ) -> Result<Vec<Qubit>, Bb84Error> {
        let records = (0..num_bits)
            .map(|_| BasisRecord {
                basis: Basis::from_coin(rng.gen()),
                bit: rng.gen_range(0..=1),
            })
            .collect();
        self.begin_sending_records(peer, records, threshold)
    }

    /// Start a round with caller-chosen bases and bits.
    pub fn begin_sending_records(
        &mut self,
        peer: NodeId,
        records: Vec<BasisRecord>,
        threshold: f64,
    ) -> Result<Vec<Qubit>, Bb84Error> {
        if records.is_empty() {
            return Err(Bb84Error::EmptyRound);
        }
        self.start_round(Bb84Role::Initiator, peer, records.len(), threshold);
        self.phase = Bb84Phase::Sending;
        self.records = records;
        info!(node = %self.node, round = self.round, num_bits = self.num_bits, "[qn-04] BB84 round started");
        Ok(self
            .records
            .iter()
            .map(|r| Qubit::prepare(r.basis, r.bit))
            .collect())
    }

    /// All qubits of the round are on the wire.
    pub fn finish_sending(&mut self) {
        if self.phase == Bb84Phase::Sending {
            self.phase = Bb84Phase::AwaitingBases;
        }
    }

    /// Peer's bases arrived: reply with the matching indices.
    pub fn on_reconcile_bases(
        &mut self,
        from: &NodeId,
        bases: &[Basis],
    ) -> Result<ControlMessage, Bb84Error> {
        self.expect(
            Bb84Role::Initiator,
            &[Bb84Phase::Sending, Bb84Phase::AwaitingBases],
            from,
            "reconcile_bases",
        )?;
        let own: Vec<Basis> = self.records.iter().map(|r| r.basis).collect();
        self.shared_indices = sifting::reconcile(&own, bases)?;
        self.phase = Bb84Phase::AwaitingErrorSample;
        debug!(node = %self.node, shared = self.shared_indices.len(), "[qn-04] Bases reconciled");
        Ok(ControlMessage::SharedBasesIndices {
            indices: self.shared_indices.clone(),
        })
    }

    /// Peer's sample arrived: decide the round.
    pub fn on_error_sample(
        &mut self,
        from: &NodeId,
        sample: &[SampledBit],
    ) -> Result<(ControlMessage, RoundOutcome), Bb84Error> {
        self.expect(
            Bb84Role::Initiator,
            &[Bb84Phase::AwaitingErrorSample],
            from,
            "estimate_error_rate",
        )?;
        let rate = sifting::estimate_error_rate(&self.records, sample)?;
        self.error_rate = Some(rate);

        if rate > self.threshold {
            self.phase = Bb84Phase::Retry;
            warn!(
                node = %self.node,
                error_rate = rate,
                threshold = self.threshold,
                "[qn-04] Error rate above threshold, round failed"
            );
            Ok((
                ControlMessage::ErrorRate { rate },
                RoundOutcome::Failed { error_rate: rate },
            ))
        } else {
            self.phase = Bb84Phase::Complete;
            let key = self.key_bits();
            info!(node = %self.node, error_rate = rate, key_len = key.len(), "[qn-04] BB84 round complete");
            Ok((
                ControlMessage::Complete,
                RoundOutcome::Completed {
                    key,
                    error_rate: Some(rate),
                },
            ))
        }
    }

    // =========================================================================
    // RESPONDER
    // =========================================================================

    /// Measure an arriving qubit in a random basis.
    ///
    /// Returns the basis list for the peer once `num_bits` qubits are in.
    pub fn on_qubit<R: Rng + ?Sized>(
        &mut self,
        qubit: Qubit,
        from: &NodeId,
        num_bits: usize,
        threshold: f64,
        rng: &mut R,
    ) -> Result<Option<ControlMessage>, Bb84Error> {
        let basis = Basis::from_coin(rng.gen());
        self.on_qubit_in(qubit, basis, from, num_bits, threshold, rng)
    }

    /// [`on_qubit`](Self::on_qubit) with a caller-chosen basis.
    pub fn on_qubit_in<R: Rng + ?Sized>(
        &mut self,
        qubit: Qubit,
        basis: Basis,
        from: &NodeId,
        num_bits: usize,
        threshold: f64,
        rng: &mut R,
    ) -> Result<Option<ControlMessage>, Bb84Error> {
        if num_bits == 0 {
            return Err(Bb84Error::EmptyRound);
        }
        match (self.role, self.phase) {
            (_, phase) if phase.is_settled() => {
                self.start_round(Bb84Role::Responder, from.clone(), num_bits, threshold);
                self.phase = Bb84Phase::Receiving;
            }
            (Some(Bb84Role::Responder), Bb84Phase::Receiving) => {
                self.check_peer(from)?;
            }
            // The peer restarted before this side settled.
            (Some(Bb84Role::Responder), _) if self.peer.as_ref() == Some(from) => {
                debug!(node = %self.node, "[qn-04] Peer restarted the round");
                self.start_round(Bb84Role::Responder, from.clone(), num_bits, threshold);
                self.phase = Bb84Phase::Receiving;
            }
            _ => {
                return Err(Bb84Error::OutOfPhase {
                    node: self.node.clone(),
                    phase: self.phase,
                    message: "qubit",
                })
            }
        }

        let bit = qubit.measure(basis, rng)?;
        self.records.push(BasisRecord { basis, bit });

        if self.records.len() < self.num_bits {
            return Ok(None);
        }
        self.phase = Bb84Phase::AwaitingSharedIndices;
        debug!(node = %self.node, measured = self.records.len(), "[qn-04] All qubits measured");
        Ok(Some(ControlMessage::ReconcileBases {
            bases: self.records.iter().map(|r| r.basis).collect(),
        }))
    }

    /// Matching indices arrived: reply with a random sample of own bits.
    pub fn on_shared_indices<R: Rng + ?Sized>(
        &mut self,
        from: &NodeId,
        indices: &[usize],
        rng: &mut R,
    ) -> Result<ControlMessage, Bb84Error> {
        self.expect(
            Bb84Role::Responder,
            &[Bb84Phase::AwaitingSharedIndices],
            from,
            "shared_bases_indices",
        )?;
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.records.len()) {
            return Err(Bb84Error::IndexOutOfRange {
                index: bad,
                len: self.records.len(),
            });
        }
        self.shared_indices = indices.to_vec();
        let sample = sifting::draw_sample(&self.records, &self.shared_indices, self.num_bits, rng);
        self.phase = Bb84Phase::AwaitingVerdict;
        debug!(node = %self.node, sample = sample.len(), "[qn-04] Error sample sent");
        Ok(ControlMessage::EstimateErrorRate { sample })
    }

    pub fn on_complete(&mut self, from: &NodeId) -> Result<Vec<Bit>, Bb84Error> {
        self.expect(
            Bb84Role::Responder,
            &[Bb84Phase::AwaitingVerdict],
            from,
            "complete",
        )?;
        self.phase = Bb84Phase::Complete;
        let key = self.key_bits();
        info!(node = %self.node, key_len = key.len(), "[qn-04] BB84 round complete");
        Ok(key)
    }

    pub fn on_error_rate(&mut self, from: &NodeId, rate: f64) -> Result<(), Bb84Error> {
        self.expect(
            Bb84Role::Responder,
            &[Bb84Phase::AwaitingVerdict],
            from,
            "error_rate",
        )?;
        self.error_rate = Some(rate);
        self.phase = Bb84Phase::Retry;
        warn!(node = %self.node, error_rate = rate, "[qn-04] Peer rejected the round");
        Ok(())
    }

    /// Dispatch a key-agreement control message.
    pub fn on_control<R: Rng + ?Sized>(
        &mut self,
        from: &NodeId,
        message: &ControlMessage,
        rng: &mut R,
    ) -> Result<Bb84Step, Bb84Error> {
        let step = match message {
            ControlMessage::ReconcileBases { bases } => Bb84Step {
                reply: Some(self.on_reconcile_bases(from, bases)?),
                outcome: None,
            },
            ControlMessage::SharedBasesIndices { indices } => Bb84Step {
                reply: Some(self.on_shared_indices(from, indices, rng)?),
                outcome: None,
            },
            ControlMessage::EstimateErrorRate { sample } => {
                let (reply, outcome) = self.on_error_sample(from, sample)?;
                Bb84Step {
                    reply: Some(reply),
                    outcome: Some(outcome),
                }
            }
            ControlMessage::Complete => Bb84Step {
                reply: None,
                outcome: Some(RoundOutcome::Completed {
                    key: self.on_complete(from)?,
                    error_rate: None,
                }),
            },
            ControlMessage::ErrorRate { rate } => {
                self.on_error_rate(from, *rate)?;
                Bb84Step {
                    reply: None,
                    outcome: Some(RoundOutcome::Failed { error_rate: *rate }),
                }
            }
            other => {
                return Err(Bb84Error::OutOfPhase {
                    node: self.node.clone(),
                    phase: self.phase,
                    message: other.kind(),
                })
            }
        };
        Ok(step)
    }

    /// The agreed key, once the round is complete.
    pub fn extract_key(&self) -> Option<Vec<Bit>> {
        (self.phase == Bb84Phase::Complete).then(|| self.key_bits())
    }

    fn key_bits(&self) -> Vec<Bit> {
        self.shared_indices
            .iter()
            .filter_map(|&i| self.records.get(i).map(|r| r.bit))
            .collect()
    }

    fn check_peer(&self, from: &NodeId) -> Result<(), Bb84Error> {
        match &self.peer {
            Some(peer) if peer != from => Err(Bb84Error::UnexpectedPeer {
                node: self.node.clone(),
                expected: peer.clone(),
                received: from.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn expect(
        &self,
        role: Bb84Role,
        phases: &[Bb84Phase],
        from: &NodeId,
        message: &'static str,
    ) -> Result<(), Bb84Error> {
        if self.role != Some(role) || !phases.contains(&self.phase) {
            return Err(Bb84Error::OutOfPhase {
                node: self.node.clone(),
                phase: self.phase,
                message,
            });
        }
        self.check_peer(from)
    }
}
