//! # Classical Node Handler
//!
//! Hosts, routers, exchanges and adapters share one forwarding loop. Every
//! packet picks its next hop from the shared route table on arrival.
//!
//! ```text
//! SendData ──► DataSent ──► route ──┬─► Forward ──► PacketTransmitted | PacketRouted
//! Packet ───► PacketReceived ──────┤
//!                                   ├─► Deliver ──► PacketDelivered, DataReceived
//!                                   │                 └─ adapter: StartQkd ─► QkdInitiated
//!                                   └─► Err ──────► RoutingError
//! ```

use qn_01_topology::AdapterBinding;
use qn_03_channels::{ClassicalConnection, Inbound};
use qn_06_routing::{Forwarder, Route};
use quantum_telemetry::{metric_inc, PACKETS_DROPPED, PACKETS_ROUTED};
use serde_json::json;
use shared_bus::{EventLevel, EventType};
use shared_types::entities::{NodeId, NodeKind};
use shared_types::errors::SimulationError;
use shared_types::messages::ClassicDataPacket;
use tracing::{debug, info};

use super::NodeContext;
use crate::container::World;
use crate::wiring::{NodeCommand, WorkerInput};

pub struct ClassicalHandler {
    kind: NodeKind,
    forwarder: Forwarder,
    connections: Vec<ClassicalConnection>,
    /// Set on adapters only.
    binding: Option<AdapterBinding>,
}

impl ClassicalHandler {
    pub fn new(node: &NodeId, kind: NodeKind, world: &World) -> Self {
        Self {
            kind,
            forwarder: Forwarder::new(node.clone(), world.routes()),
            connections: world.connections_of(node),
            binding: world.topology().adapter(node).cloned(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub async fn handle(
        &mut self,
        ctx: &mut NodeContext,
        input: WorkerInput,
    ) -> Result<(), SimulationError> {
        match input {
            WorkerInput::Command(NodeCommand::SendData { to, payload }) => {
                self.originate(ctx, to, payload).await
            }
            WorkerInput::Inbound(Inbound::Packet { packet, from }) => {
                self.receive(ctx, packet, from).await
            }
            WorkerInput::Command(command) => Err(SimulationError::ProtocolViolation {
                node: ctx.node.clone(),
                reason: format!("{} cannot execute {command:?}", self.kind),
            }),
            WorkerInput::Inbound(item) => Err(SimulationError::ProtocolViolation {
                node: ctx.node.clone(),
                reason: format!("{} received a {} from {}", self.kind, item.kind(), item.from()),
            }),
        }
    }

    async fn originate(
        &self,
        ctx: &mut NodeContext,
        to: NodeId,
        payload: String,
    ) -> Result<(), SimulationError> {
        let packet = ClassicDataPacket::new(ctx.node.clone(), to, payload);
        info!(node = %ctx.node, packet = %packet.id, destination = %packet.destination, "[node] Data sent");
        ctx.events
            .emit(
                EventType::DataSent,
                json!({
                    "packet_id": packet.id,
                    "destination": packet.destination,
                    "payload": packet.payload,
                }),
            )
            .await;
        self.forward(ctx, packet).await
    }

    async fn receive(
        &self,
        ctx: &mut NodeContext,
        packet: ClassicDataPacket,
        from: NodeId,
    ) -> Result<(), SimulationError> {
        ctx.events
            .emit(
                EventType::PacketReceived,
                json!({ "packet_id": packet.id, "from": from }),
            )
            .await;
        if let Some(next_hop) = packet.next_hop.as_ref().filter(|hop| **hop != ctx.node) {
            metric_inc!(PACKETS_DROPPED, &["misdirected"]);
            return Err(SimulationError::ProtocolViolation {
                node: ctx.node.clone(),
                reason: format!("packet {} was addressed to next hop {next_hop}", packet.id),
            });
        }
        self.forward(ctx, packet).await
    }

    async fn forward(
        &self,
        ctx: &mut NodeContext,
        mut packet: ClassicDataPacket,
    ) -> Result<(), SimulationError> {
        let route = match self.forwarder.route(&mut packet, &self.connections) {
            Ok(route) => route,
            Err(err) => {
                metric_inc!(PACKETS_DROPPED, &[err.reason()]);
                ctx.events
                    .emit_at(
                        EventLevel::Warning,
                        EventType::RoutingError,
                        json!({
                            "packet_id": packet.id,
                            "destination": packet.destination,
                            "error": err.to_string(),
                        }),
                    )
                    .await;
                return Err(err.into());
            }
        };

        match route {
            Route::Deliver => self.deliver(ctx, packet).await,
            Route::Forward {
                next_hop,
                connection,
            } => {
                let packet_id = packet.id;
                let originated = packet.source == ctx.node && packet.hops().len() == 1;
                connection.transmit_packet(packet, &ctx.node, ctx.mailboxes.as_ref())?;

                if originated {
                    ctx.events
                        .emit(
                            EventType::PacketTransmitted,
                            json!({ "packet_id": packet_id, "next_hop": next_hop }),
                        )
                        .await;
                } else {
                    metric_inc!(PACKETS_ROUTED);
                    debug!(node = %ctx.node, packet = %packet_id, next_hop = %next_hop, "[node] Packet routed");
                    ctx.events
                        .emit(
                            EventType::PacketRouted,
                            json!({ "packet_id": packet_id, "next_hop": next_hop }),
                        )
                        .await;
                }
                Ok(())
            }
        }
    }

    async fn deliver(
        &self,
        ctx: &mut NodeContext,
        packet: ClassicDataPacket,
    ) -> Result<(), SimulationError> {
        info!(
            node = %ctx.node,
            packet = %packet.id,
            source = %packet.source,
            hops = packet.hops().len(),
            "[node] Packet delivered"
        );
        ctx.events
            .emit(
                EventType::PacketDelivered,
                json!({
                    "packet_id": packet.id,
                    "source": packet.source,
                    "hops": packet.hops(),
                }),
            )
            .await;
        ctx.events
            .emit(
                EventType::DataReceived,
                json!({
                    "packet_id": packet.id,
                    "source": packet.source,
                    "payload": packet.payload,
                }),
            )
            .await;

        if let Some(binding) = &self.binding {
            ctx.mailboxes
                .command(&binding.quantum_host, NodeCommand::StartQkd)?;
            info!(node = %ctx.node, quantum_host = %binding.quantum_host, "[node] Adapter initiating QKD");
            ctx.events
                .emit(
                    EventType::QkdInitiated,
                    json!({
                        "quantum_host": binding.quantum_host,
                        "trigger": "adapter",
                        "packet_id": packet.id,
                    }),
                )
                .await;
        }
        Ok(())
    }
}
