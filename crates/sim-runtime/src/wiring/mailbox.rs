//! # Mailboxes
//!
//! One bounded `mpsc` queue per node. Channels push into it through
//! [`InboxSink`]; the simulator pushes commands. Only the owning worker
//! reads from it.

use std::collections::HashMap;

use qn_03_channels::{ChannelError, Inbound, InboxSink};
use shared_types::entities::NodeId;
use shared_types::errors::SimulationError;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

/// Instructions from outside the simulated network.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeCommand {
    /// Originate a data packet.
    SendData { to: NodeId, payload: String },
    /// Begin key agreement on the host's first quantum channel.
    StartQkd,
    /// Re-run the last round this host initiated.
    RetryQkd,
    /// Generate a Bell pair toward `target` and send half of it out.
    RequestEntanglement { target: NodeId },
}

/// Everything a worker can find in its queue.
#[derive(Debug)]
pub enum WorkerInput {
    Inbound(Inbound),
    Command(NodeCommand),
}

pub type Inbox = mpsc::Receiver<WorkerInput>;

#[derive(Debug, Default)]
pub struct Mailboxes {
    senders: HashMap<NodeId, mpsc::Sender<WorkerInput>>,
}

impl Mailboxes {
    /// Create a queue of `capacity` for every node, returning the receiving ends.
    pub fn open<I>(nodes: I, capacity: usize) -> (Self, HashMap<NodeId, Inbox>)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut senders = HashMap::new();
        let mut inboxes = HashMap::new();
        for node in nodes {
            let (tx, rx) = mpsc::channel(capacity);
            senders.insert(node.clone(), tx);
            inboxes.insert(node, rx);
        }
        (Self { senders }, inboxes)
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.senders.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    pub fn command(&self, to: &NodeId, command: NodeCommand) -> Result<(), SimulationError> {
        self.push(to, WorkerInput::Command(command))
            .map_err(|reason| SimulationError::DeliveryFailed {
                to: to.clone(),
                reason,
            })
    }

    fn push(&self, to: &NodeId, input: WorkerInput) -> Result<(), String> {
        let sender = self
            .senders
            .get(to)
            .ok_or_else(|| "no inbox for node".to_string())?;
        sender.try_send(input).map_err(|e| match e {
            TrySendError::Full(_) => "inbox full".to_string(),
            TrySendError::Closed(_) => "inbox closed".to_string(),
        })
    }
}

impl InboxSink for Mailboxes {
    fn deliver(&self, to: &NodeId, item: Inbound) -> Result<(), ChannelError> {
        trace!(to = %to, kind = item.kind(), from = %item.from(), "Inbox hand-off");
        self.push(to, WorkerInput::Inbound(item))
            .map_err(|reason| ChannelError::Delivery {
                to: to.clone(),
                reason,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::messages::ControlMessage;

    fn control(from: &str) -> Inbound {
        Inbound::Control {
            message: ControlMessage::Complete,
            from: from.into(),
        }
    }

    #[tokio::test]
    async fn test_deliver_reaches_owner_only() {
        let (mailboxes, mut inboxes) = Mailboxes::open(["a".into(), "b".into()], 4);
        mailboxes.deliver(&"b".into(), control("a")).unwrap();

        let mut a = inboxes.remove(&NodeId::from("a")).unwrap();
        let mut b = inboxes.remove(&NodeId::from("b")).unwrap();
        assert!(a.try_recv().is_err());
        assert!(matches!(
            b.try_recv(),
            Ok(WorkerInput::Inbound(Inbound::Control { .. }))
        ));
    }

    #[tokio::test]
    async fn test_full_inbox_refuses() {
        let (mailboxes, _inboxes) = Mailboxes::open(["a".into()], 1);
        mailboxes.deliver(&"a".into(), control("x")).unwrap();
        let err = mailboxes.deliver(&"a".into(), control("x")).unwrap_err();
        assert_eq!(
            err,
            ChannelError::Delivery {
                to: "a".into(),
                reason: "inbox full".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_node_and_closed_inbox() {
        let (mailboxes, inboxes) = Mailboxes::open(["a".into()], 1);
        assert!(matches!(
            mailboxes.command(&"zz".into(), NodeCommand::StartQkd),
            Err(SimulationError::DeliveryFailed { .. })
        ));
        drop(inboxes);
        let err = mailboxes.command(&"a".into(), NodeCommand::StartQkd).unwrap_err();
        assert_eq!(
            err,
            SimulationError::DeliveryFailed {
                to: "a".into(),
                reason: "inbox closed".into()
            }
        );
    }
}
