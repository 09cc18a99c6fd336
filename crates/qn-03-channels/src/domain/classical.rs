//! Classical connections: direct, lossless transport of packets.

use qn_01_topology::{Edge, EdgeId, EdgeKind};
use shared_types::entities::NodeId;
use shared_types::messages::ClassicDataPacket;
use tracing::trace;

use super::errors::ChannelError;
use super::inbound::Inbound;
use crate::ports::InboxSink;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassicalConnection {
    pub id: EdgeId,
    pub name: String,
    pub endpoints: (NodeId, NodeId),
    pub bandwidth: u64,
    pub latency: u64,
}

impl ClassicalConnection {
    pub fn from_edge(edge: &Edge) -> Option<Self> {
        match &edge.kind {
            EdgeKind::Classical(p) => Some(Self {
                id: edge.id,
                name: edge.name.clone(),
                endpoints: edge.endpoints.clone(),
                bandwidth: p.bandwidth,
                latency: p.latency,
            }),
            EdgeKind::Quantum(_) => None,
        }
    }

    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.endpoints.0 == a && &self.endpoints.1 == b)
            || (&self.endpoints.0 == b && &self.endpoints.1 == a)
    }

    pub fn other_end(&self, node: &NodeId) -> Option<&NodeId> {
        if &self.endpoints.0 == node {
            Some(&self.endpoints.1)
        } else if &self.endpoints.1 == node {
            Some(&self.endpoints.0)
        } else {
            None
        }
    }

    /// Hand `packet` to the endpoint opposite `sender`.
    pub fn transmit_packet<S: InboxSink + ?Sized>(
        &self,
        packet: ClassicDataPacket,
        sender: &NodeId,
        sink: &S,
    ) -> Result<NodeId, ChannelError> {
        let receiver = self
            .other_end(sender)
            .ok_or_else(|| ChannelError::UnknownSender {
                channel: self.name.clone(),
                node: sender.clone(),
            })?
            .clone();
        trace!(connection = %self.id, from = %sender, to = %receiver, packet = %packet.id, "packet on wire");
        sink.deliver(
            &receiver,
            Inbound::Packet {
                packet,
                from: sender.clone(),
            },
        )?;
        Ok(receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemorySink;
    use qn_01_topology::ClassicalLinkParams;

    fn connection() -> ClassicalConnection {
        ClassicalConnection::from_edge(&Edge {
            id: EdgeId(0),
            name: "h1 <-> r1".into(),
            endpoints: ("h1".into(), "r1".into()),
            kind: EdgeKind::Classical(ClassicalLinkParams {
                bandwidth: 1000,
                latency: 2,
                length: 1.0,
            }),
        })
        .unwrap()
    }

    #[test]
    fn test_packet_reaches_other_end() {
        let conn = connection();
        let sink = MemorySink::default();
        let packet = ClassicDataPacket::new("h1".into(), "h2".into(), "hello");
        let to = conn.transmit_packet(packet, &"r1".into(), &sink).unwrap();
        assert_eq!(to, NodeId::from("h1"));
        let items = sink.take();
        assert!(matches!(&items[0].1, Inbound::Packet { from, .. } if from == &NodeId::from("r1")));
    }

    #[test]
    fn test_sender_must_be_endpoint() {
        let conn = connection();
        assert!(conn.connects(&"r1".into(), &"h1".into()));
        assert!(conn
            .transmit_packet(
                ClassicDataPacket::new("x".into(), "y".into(), String::new()),
                &"x".into(),
                &MemorySink::default()
            )
            .is_err());
    }
}
