//! Field-level checks applied while building the arena.

use shared_types::entities::{NodeKind, ProtocolMode};

use super::entities::{NoiseModel, QuantumLinkParams};
use super::errors::TopologyError;
use crate::description::{ConnectionDescription, NodeDescription};

/// Parse the node's type tag.
pub fn node_kind(desc: &NodeDescription) -> Result<NodeKind, TopologyError> {
    desc.kind
        .parse::<NodeKind>()
        .map_err(|_| TopologyError::UnknownNodeType {
            node: desc.name.clone(),
            tag: desc.kind.clone(),
        })
}

/// Protocol for a node; repeaters default to entanglement swapping.
pub fn protocol(desc: &NodeDescription, kind: NodeKind) -> Result<ProtocolMode, TopologyError> {
    match &desc.protocol {
        Some(p) => p
            .parse::<ProtocolMode>()
            .map_err(|_| TopologyError::UnknownProtocol {
                node: desc.name.clone(),
                protocol: p.clone(),
            }),
        None if kind == NodeKind::QuantumRepeater => Ok(ProtocolMode::EntanglementSwapping),
        None => Ok(ProtocolMode::Bb84),
    }
}

/// Validate and convert the quantum parameters of a connection.
pub fn quantum_params(
    name: &str,
    desc: &ConnectionDescription,
) -> Result<QuantumLinkParams, TopologyError> {
    let invalid = |reason: String| TopologyError::InvalidQuantumParameters {
        connection: name.to_string(),
        reason,
    };

    if desc.num_bits == 0 {
        return Err(invalid("num_bits must be positive".into()));
    }
    if !(0.0..=1.0).contains(&desc.error_rate_threshold) {
        return Err(invalid(format!(
            "error_rate_threshold {} outside [0, 1]",
            desc.error_rate_threshold
        )));
    }
    if desc.loss_per_km < 0.0 || !desc.loss_per_km.is_finite() {
        return Err(invalid(format!("loss_per_km {} is negative", desc.loss_per_km)));
    }
    if desc.length < 0.0 || !desc.length.is_finite() {
        return Err(invalid(format!("length {} is negative", desc.length)));
    }
    if !(0.0..=1.0).contains(&desc.noise_strength) {
        return Err(invalid(format!(
            "noise_strength {} outside [0, 1]",
            desc.noise_strength
        )));
    }

    let noise_model =
        desc.noise_model
            .parse::<NoiseModel>()
            .map_err(|model| TopologyError::UnknownNoiseModel {
                connection: name.to_string(),
                model,
            })?;

    Ok(QuantumLinkParams {
        length: desc.length,
        loss_per_km: desc.loss_per_km,
        noise_model,
        noise_strength: desc.noise_strength,
        num_bits: desc.num_bits,
        error_rate_threshold: desc.error_rate_threshold,
    })
}
