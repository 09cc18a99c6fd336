//! # Quantum Host Handler
//!
//! Key agreement end point. Depending on its wiring and protocol tag a host
//! plays one of three parts:
//!
//! - **BB84 end host**: runs rounds over its first quantum channel.
//! - **Relay**: a BB84 host with exactly two quantum channels measures every
//!   passing qubit and resends it (intercept-resend).
//! - **Entanglement end host**: sends half of a Bell pair toward the repeater
//!   chain, applies the repeater's correction, then runs BB84 over the
//!   resulting logical channel.
//!
//! Control messages go straight to the peer's inbox; qubits always travel
//! through a channel.

use qn_02_quantum_state::Qubit;
use qn_03_channels::{ChannelId, Inbound, InboxSink, QuantumChannel};
use qn_04_bb84::{Bb84Role, Bb84Session, InterceptResend, RoundOutcome};
use qn_05_entanglement::{resolve_end_host, CorrectionRequest, EntanglementError, EntanglementSession};
use quantum_telemetry::{metric_inc, LAST_QBER, QKD_ROUNDS, QUBITS_DROPPED, QUBITS_TRANSMITTED};
use serde_json::json;
use shared_bus::{EventLevel, EventType};
use shared_types::entities::{Bit, NodeId, NodeKind, ProtocolMode};
use shared_types::errors::SimulationError;
use shared_types::messages::ControlMessage;
use tracing::{debug, info, trace, warn};

use super::NodeContext;
use crate::container::World;
use crate::keys::SharedKey;
use crate::wiring::{NodeCommand, WorkerInput};

pub struct QuantumHostHandler {
    node: NodeId,
    protocol: ProtocolMode,
    channels: Vec<QuantumChannel>,
    bb84: Bb84Session,
    entanglement: EntanglementSession,
    relay: Option<InterceptResend>,
    retries: u32,
}

impl QuantumHostHandler {
    pub fn new(node: &NodeId, protocol: ProtocolMode, world: &World) -> Self {
        let relay = world
            .is_relay(node)
            .then(|| InterceptResend::new(node.clone()));
        Self {
            node: node.clone(),
            protocol,
            channels: world.quantum_channels_of(node),
            bb84: Bb84Session::new(node.clone()),
            entanglement: EntanglementSession::new(node.clone()),
            relay,
            retries: 0,
        }
    }

    pub fn is_relay(&self) -> bool {
        self.relay.is_some()
    }

    pub fn bb84(&self) -> &Bb84Session {
        &self.bb84
    }

    pub fn entanglement(&self) -> &EntanglementSession {
        &self.entanglement
    }

    pub async fn handle(
        &mut self,
        ctx: &mut NodeContext,
        input: WorkerInput,
    ) -> Result<(), SimulationError> {
        match input {
            WorkerInput::Command(NodeCommand::StartQkd) => self.start_qkd(ctx).await,
            WorkerInput::Command(NodeCommand::RetryQkd) => self.retry(ctx).await,
            WorkerInput::Command(NodeCommand::RequestEntanglement { target }) => {
                self.request_entanglement(ctx, target).await
            }
            WorkerInput::Command(NodeCommand::SendData { .. }) => {
                Err(self.violation("quantum hosts do not originate data packets"))
            }
            WorkerInput::Inbound(Inbound::Qubit {
                qubit,
                from,
                channel,
            }) => self.on_qubit(ctx, qubit, from, channel).await,
            WorkerInput::Inbound(Inbound::Control { message, from }) => {
                self.on_control(ctx, message, from).await
            }
            WorkerInput::Inbound(Inbound::Packet { packet, from }) => Err(self.violation(format!(
                "classical packet {} from {from} reached a quantum host",
                packet.id
            ))),
        }
    }

    fn violation(&self, reason: impl Into<String>) -> SimulationError {
        SimulationError::ProtocolViolation {
            node: self.node.clone(),
            reason: reason.into(),
        }
    }

    fn mismatch(&self, expected: ProtocolMode) -> SimulationError {
        SimulationError::ProtocolModeMismatch {
            node: self.node.clone(),
            expected,
            actual: self.protocol,
        }
    }

    fn first_channel(&self) -> Result<&QuantumChannel, SimulationError> {
        self.channels
            .first()
            .ok_or_else(|| SimulationError::ChannelNotFound(self.node.clone()))
    }

    /// The channel key agreement runs over: the logical link once entangled.
    fn key_channel(&self) -> Result<QuantumChannel, SimulationError> {
        match self.entanglement.link() {
            Some(link) => Ok(link.clone()),
            None => self.first_channel().cloned(),
        }
    }

    fn send_control(
        &self,
        ctx: &NodeContext,
        to: &NodeId,
        message: ControlMessage,
    ) -> Result<(), SimulationError> {
        trace!(node = %self.node, to = %to, kind = message.kind(), "[node] Control message sent");
        ctx.mailboxes.deliver(
            to,
            Inbound::Control {
                message,
                from: self.node.clone(),
            },
        )?;
        Ok(())
    }

    // =========================================================================
    // ROUND START
    // =========================================================================

    async fn start_qkd(&mut self, ctx: &mut NodeContext) -> Result<(), SimulationError> {
        if self.is_relay() {
            return Err(self.violation("relay hosts do not initiate key agreement"));
        }
        if let Some(link) = self.entanglement.link().cloned() {
            let peer = link
                .other_end(&self.node)
                .cloned()
                .ok_or_else(|| SimulationError::ChannelNotFound(self.node.clone()))?;
            return self.begin_round(ctx, link, peer).await;
        }

        let channel = self.first_channel()?.clone();
        let neighbor = channel
            .other_end(&self.node)
            .cloned()
            .ok_or_else(|| SimulationError::ChannelNotFound(self.node.clone()))?;

        match self.protocol {
            ProtocolMode::Bb84 => {
                let peer = ctx.world.key_peer(&self.node, &neighbor);
                self.begin_round(ctx, channel, peer).await
            }
            ProtocolMode::EntanglementSwapping => {
                if ctx.world.kind_of(&neighbor) != Some(NodeKind::QuantumRepeater) {
                    return Err(self.violation(format!(
                        "entanglement swapping needs a repeater, first hop {neighbor} is not one"
                    )));
                }
                let target = resolve_end_host(ctx.world.topology(), &self.node, &neighbor)
                    .ok_or_else(|| {
                        EntanglementError::EndHostNotFound {
                            repeater: neighbor.clone(),
                            neighbor: neighbor.clone(),
                        }
                        .into_simulation_error(&self.node)
                    })?;
                self.request_entanglement(ctx, target.clone()).await?;
                ctx.mailboxes.command(
                    &target,
                    NodeCommand::RequestEntanglement {
                        target: self.node.clone(),
                    },
                )
            }
        }
    }

    async fn retry(&mut self, ctx: &mut NodeContext) -> Result<(), SimulationError> {
        if self.bb84.role() != Some(Bb84Role::Initiator) {
            return Err(self.violation("no initiated round to retry"));
        }
        let peer = self
            .bb84
            .peer()
            .cloned()
            .ok_or_else(|| self.violation("no initiated round to retry"))?;
        let channel = self.key_channel()?;
        info!(node = %self.node, peer = %peer, round = self.bb84.round(), "[node] Retrying BB84 round");
        self.begin_round(ctx, channel, peer).await
    }

    /// Keep one half of a fresh `|Φ+⟩` for `target` and send the other half
    /// toward the repeater chain.
    async fn request_entanglement(
        &mut self,
        ctx: &mut NodeContext,
        target: NodeId,
    ) -> Result<(), SimulationError> {
        if self.protocol != ProtocolMode::EntanglementSwapping {
            return Err(self.mismatch(ProtocolMode::EntanglementSwapping));
        }
        let channel = self.first_channel()?.clone();
        let first_hop = channel
            .other_end(&self.node)
            .cloned()
            .ok_or_else(|| SimulationError::ChannelNotFound(self.node.clone()))?;

        ctx.events
            .emit(
                EventType::RepeaterEntanglementInitialized,
                json!({ "host": self.node, "target": target }),
            )
            .await;

        let half = self.entanglement.request(target.clone());
        let pair = half.pair_id();
        ctx.events
            .info("bell_state_generated", json!({ "state": "phi_plus", "pair": pair }))
            .await;

        channel.transmit(half, &self.node, ctx.mailboxes.as_ref())?;
        metric_inc!(QUBITS_TRANSMITTED);
        ctx.events
            .info(
                "bell_state_transferred",
                json!({ "target": first_hop, "partner": target, "pair": pair }),
            )
            .await;
        Ok(())
    }

    async fn begin_round(
        &mut self,
        ctx: &mut NodeContext,
        channel: QuantumChannel,
        peer: NodeId,
    ) -> Result<(), SimulationError> {
        let qubits = self
            .bb84
            .begin_sending(
                peer.clone(),
                channel.num_bits,
                channel.error_rate_threshold,
                &mut ctx.rng,
            )
            .map_err(|e| e.into_simulation_error(&self.node))?;
        metric_inc!(QKD_ROUNDS, &["started"]);
        let round = self.bb84.round();
        let count = qubits.len();
        ctx.events
            .emit(
                EventType::TransmissionStarted,
                json!({
                    "peer": peer,
                    "channel": channel.name,
                    "round": round,
                    "num_bits": count,
                }),
            )
            .await;

        let mut altered = 0usize;
        for qubit in qubits {
            if channel.transmit(qubit, &self.node, ctx.mailboxes.as_ref())? {
                altered += 1;
            }
            metric_inc!(QUBITS_TRANSMITTED);
        }
        self.bb84.finish_sending();

        ctx.events
            .emit(
                EventType::PacketTransmitted,
                json!({ "peer": peer, "channel": channel.name, "round": round, "qubits": count }),
            )
            .await;
        if altered > 0 {
            ctx.events
                .emit_at(
                    EventLevel::Warning,
                    EventType::PacketCorrupted,
                    json!({ "channel": channel.name, "round": round, "altered": altered, "qubits": count }),
                )
                .await;
        }
        Ok(())
    }

    // =========================================================================
    // QUBITS
    // =========================================================================

    async fn on_qubit(
        &mut self,
        ctx: &mut NodeContext,
        qubit: Qubit,
        from: NodeId,
        arrived_on: ChannelId,
    ) -> Result<(), SimulationError> {
        if let Some(relay) = self.relay.as_mut() {
            let out = InterceptResend::forward_channel(&self.channels, &arrived_on)
                .ok_or_else(|| SimulationError::ChannelNotFound(self.node.clone()))?;
            let resent = relay
                .intercept(qubit, &mut ctx.rng)
                .map_err(|e| e.into_simulation_error(&self.node))?;
            out.transmit(resent, &self.node, ctx.mailboxes.as_ref())?;
            metric_inc!(QUBITS_TRANSMITTED);
            trace!(node = %self.node, from = %from, intercepted = relay.intercepted(), "[node] Qubit relayed");
            return Ok(());
        }

        let (channel, peer) = match &arrived_on {
            ChannelId::Logical(..) => {
                let link = self
                    .entanglement
                    .link()
                    .filter(|link| link.id == arrived_on)
                    .ok_or_else(|| {
                        self.violation(format!("qubit on unknown entangled channel {arrived_on}"))
                    })?;
                (link.clone(), from)
            }
            ChannelId::Edge(_) => {
                if self.protocol != ProtocolMode::Bb84 {
                    metric_inc!(QUBITS_DROPPED, &["mode_mismatch"]);
                    return Err(self.mismatch(ProtocolMode::Bb84));
                }
                let channel = self
                    .channels
                    .iter()
                    .find(|c| c.id == arrived_on)
                    .cloned()
                    .ok_or_else(|| SimulationError::ChannelNotFound(self.node.clone()))?;
                (channel, ctx.world.key_peer(&self.node, &from))
            }
        };

        let reply = self
            .bb84
            .on_qubit(
                qubit,
                &peer,
                channel.num_bits,
                channel.error_rate_threshold,
                &mut ctx.rng,
            )
            .map_err(|e| e.into_simulation_error(&self.node))?;

        if let Some(message) = reply {
            ctx.events
                .emit(
                    EventType::PacketReceived,
                    json!({
                        "peer": peer,
                        "channel": channel.name,
                        "round": self.bb84.round(),
                        "qubits": channel.num_bits,
                    }),
                )
                .await;
            self.send_control(ctx, &peer, message)?;
        }
        Ok(())
    }

    // =========================================================================
    // CONTROL MESSAGES
    // =========================================================================

    async fn on_control(
        &mut self,
        ctx: &mut NodeContext,
        message: ControlMessage,
        from: NodeId,
    ) -> Result<(), SimulationError> {
        match message {
            ControlMessage::EntanglementSwapCorrection {
                measurement_result,
                other_node_address,
            } => {
                let request = CorrectionRequest {
                    measurement_result,
                    other_node_address,
                };
                self.on_correction(ctx, request).await
            }
            ControlMessage::EntanglementEstablished { partner, num_bits } => {
                self.on_established(ctx, partner, num_bits, from).await
            }
            message => self.on_key_agreement(ctx, message, from).await,
        }
    }

    async fn on_correction(
        &mut self,
        ctx: &mut NodeContext,
        request: CorrectionRequest,
    ) -> Result<(), SimulationError> {
        if self.protocol != ProtocolMode::EntanglementSwapping {
            return Err(self.mismatch(ProtocolMode::EntanglementSwapping));
        }
        let (num_bits, threshold) = {
            let channel = self.first_channel()?;
            (channel.num_bits, channel.error_rate_threshold)
        };
        let link = self
            .entanglement
            .apply_correction(&request, num_bits, threshold)
            .map_err(|e| e.into_simulation_error(&self.node))?;

        ctx.events
            .info(
                "apply_entanglement_correction",
                json!({
                    "measurement_result": request.measurement_result,
                    "correction": link.correction,
                }),
            )
            .await;
        ctx.events
            .emit(
                EventType::RepeaterEntangled,
                json!({
                    "other_node_addr": link.partner,
                    "measurement_result": request.measurement_result,
                    "correction": link.correction,
                }),
            )
            .await;

        self.send_control(
            ctx,
            &link.partner,
            ControlMessage::EntanglementEstablished {
                partner: self.node.clone(),
                num_bits,
            },
        )?;
        self.begin_round(ctx, link.channel, link.partner).await
    }

    async fn on_established(
        &mut self,
        ctx: &mut NodeContext,
        partner: NodeId,
        num_bits: usize,
        from: NodeId,
    ) -> Result<(), SimulationError> {
        if self.protocol != ProtocolMode::EntanglementSwapping {
            return Err(self.mismatch(ProtocolMode::EntanglementSwapping));
        }
        if partner != from || self.entanglement.partner() != Some(&partner) {
            return Err(SimulationError::StaleHandshake {
                node: self.node.clone(),
                expected: self.entanglement.partner().cloned(),
                received: partner,
            });
        }
        let threshold = self.first_channel()?.error_rate_threshold;
        let name = self
            .entanglement
            .accept_link(partner.clone(), num_bits, threshold)
            .name
            .clone();
        ctx.events
            .info(
                "entangled_channel_accepted",
                json!({ "partner": partner, "channel": name }),
            )
            .await;
        Ok(())
    }

    async fn on_key_agreement(
        &mut self,
        ctx: &mut NodeContext,
        message: ControlMessage,
        from: NodeId,
    ) -> Result<(), SimulationError> {
        if self.protocol == ProtocolMode::EntanglementSwapping && self.entanglement.link().is_none()
        {
            return Err(self.mismatch(ProtocolMode::Bb84));
        }
        let step = self
            .bb84
            .on_control(&from, &message, &mut ctx.rng)
            .map_err(|e| e.into_simulation_error(&self.node))?;
        if let Some(reply) = step.reply {
            self.send_control(ctx, &from, reply)?;
        }
        match step.outcome {
            Some(RoundOutcome::Completed { key, error_rate }) => {
                self.on_completed(ctx, from, key, error_rate).await;
                Ok(())
            }
            Some(RoundOutcome::Failed { error_rate }) => self.on_failed(ctx, from, error_rate).await,
            None => Ok(()),
        }
    }

    async fn on_completed(
        &mut self,
        ctx: &mut NodeContext,
        peer: NodeId,
        key: Vec<Bit>,
        error_rate: Option<f64>,
    ) {
        metric_inc!(QKD_ROUNDS, &["completed"]);
        if let Some(rate) = error_rate {
            LAST_QBER.set(rate);
        }
        self.retries = 0;
        let round = self.bb84.round();
        info!(node = %self.node, peer = %peer, round, key_len = key.len(), "[node] Key established");
        ctx.events
            .emit(
                EventType::QkdCompleted,
                json!({
                    "peer": peer,
                    "round": round,
                    "key_len": key.len(),
                    "error_rate": error_rate,
                }),
            )
            .await;
        ctx.keys.insert(
            self.node.clone(),
            SharedKey {
                peer,
                key,
                round,
                error_rate,
            },
        );
    }

    async fn on_failed(
        &mut self,
        ctx: &mut NodeContext,
        peer: NodeId,
        error_rate: f64,
    ) -> Result<(), SimulationError> {
        if self.bb84.role() != Some(Bb84Role::Initiator) {
            debug!(node = %self.node, peer = %peer, error_rate, "[node] Peer rejected the round");
            return Ok(());
        }

        metric_inc!(QKD_ROUNDS, &["failed"]);
        LAST_QBER.set(error_rate);
        let round = self.bb84.round();
        ctx.events
            .emit_at(
                EventLevel::Warning,
                EventType::QkdFailed,
                json!({
                    "peer": peer,
                    "round": round,
                    "error_rate": error_rate,
                    "threshold": self.bb84.threshold(),
                }),
            )
            .await;

        if !ctx.config.auto_retry_qkd {
            return Ok(());
        }
        if self.retries >= ctx.config.max_qkd_retries {
            warn!(node = %self.node, retries = self.retries, "[node] Retry budget exhausted");
            return Ok(());
        }
        self.retries += 1;
        ctx.events
            .emit(
                EventType::QkdInitiated,
                json!({ "peer": peer, "trigger": "auto_retry", "attempt": self.retries }),
            )
            .await;
        self.retry(ctx).await
    }
}
