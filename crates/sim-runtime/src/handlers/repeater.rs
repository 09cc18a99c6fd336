//! Repeater worker: buffers, forwards and swaps incoming Bell-pair halves.

use qn_02_quantum_state::Qubit;
use qn_03_channels::{Inbound, InboxSink, QuantumChannel};
use qn_05_entanglement::{RepeaterAction, RepeaterService};
use quantum_telemetry::{metric_inc, ENTANGLEMENT_SWAPS, QUBITS_DROPPED, QUBITS_TRANSMITTED};
use serde_json::json;
use shared_types::entities::NodeId;
use shared_types::errors::SimulationError;

use super::NodeContext;
use crate::container::World;
use crate::wiring::WorkerInput;

pub struct RepeaterHandler {
    service: RepeaterService,
    channels: Vec<QuantumChannel>,
}

impl RepeaterHandler {
    pub fn new(node: &NodeId, num_memories: usize, world: &World) -> Self {
        Self {
            service: RepeaterService::new(node.clone(), num_memories),
            channels: world.quantum_channels_of(node),
        }
    }

    pub fn service(&self) -> &RepeaterService {
        &self.service
    }

    pub async fn handle(
        &mut self,
        ctx: &mut NodeContext,
        input: WorkerInput,
    ) -> Result<(), SimulationError> {
        match input {
            WorkerInput::Inbound(Inbound::Qubit { qubit, from, .. }) => {
                self.on_qubit(ctx, qubit, from).await
            }
            WorkerInput::Inbound(item) => Err(SimulationError::ProtocolViolation {
                node: ctx.node.clone(),
                reason: format!("repeater received a {} from {}", item.kind(), item.from()),
            }),
            WorkerInput::Command(command) => Err(SimulationError::ProtocolViolation {
                node: ctx.node.clone(),
                reason: format!("repeater cannot execute {command:?}"),
            }),
        }
    }

    async fn on_qubit(
        &mut self,
        ctx: &mut NodeContext,
        qubit: Qubit,
        from: NodeId,
    ) -> Result<(), SimulationError> {
        let action = self
            .service
            .on_qubit(qubit, &from, ctx.world.topology(), &mut ctx.rng)
            .map_err(|e| e.into_simulation_error(&ctx.node))?;

        match action {
            RepeaterAction::Forward { to, qubit } => {
                let channel = self
                    .channels
                    .iter()
                    .find(|c| c.connects(&ctx.node, &to))
                    .ok_or_else(|| SimulationError::ChannelNotFound(ctx.node.clone()))?;
                channel.transmit(qubit, &ctx.node, ctx.mailboxes.as_ref())?;
                metric_inc!(QUBITS_TRANSMITTED);
                ctx.events
                    .info("qubit_forwarded", json!({ "from": from, "to": to }))
                    .await;
            }
            RepeaterAction::Buffered { occupancy } => {
                ctx.events
                    .info(
                        "qubit_buffered",
                        json!({
                            "from": from,
                            "occupancy": occupancy,
                            "capacity": self.service.memory().capacity(),
                        }),
                    )
                    .await;
            }
            RepeaterAction::Swapped(dispatch) => {
                metric_inc!(ENTANGLEMENT_SWAPS);
                ctx.events
                    .info(
                        "attempting_swap",
                        json!({
                            "sender": dispatch.measured.0,
                            "receiver": dispatch.measured.1,
                        }),
                    )
                    .await;
                ctx.events
                    .info(
                        "performed_bell_measurement",
                        json!({
                            "measurement_result": dispatch.outcome,
                            "to": dispatch.to,
                            "other": dispatch.other,
                        }),
                    )
                    .await;
                ctx.mailboxes.deliver(
                    &dispatch.to,
                    Inbound::Control {
                        message: dispatch.message(),
                        from: ctx.node.clone(),
                    },
                )?;
            }
            RepeaterAction::Dropped(err) => {
                metric_inc!(QUBITS_DROPPED, &["memory_full"]);
                return Err(err.into_simulation_error(&ctx.node));
            }
        }
        Ok(())
    }
}
