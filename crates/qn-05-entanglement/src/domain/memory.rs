//! Bounded repeater memory. One slot per sending neighbor.

use qn_02_quantum_state::Qubit;
use shared_types::entities::NodeId;

use super::errors::EntanglementError;

#[derive(Debug, Clone)]
pub struct RepeaterMemory {
    node: NodeId,
    capacity: usize,
    slots: Vec<(NodeId, Qubit)>,
}

impl RepeaterMemory {
    pub fn new(node: NodeId, capacity: usize) -> Self {
        Self {
            node,
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= self.capacity
    }

    /// Senders in arrival order.
    pub fn senders(&self) -> impl Iterator<Item = &NodeId> {
        self.slots.iter().map(|(from, _)| from)
    }

    /// Store a qubit under its sender.
    ///
    /// A full memory rejects the qubit even if the sender already holds a
    /// slot; otherwise a second qubit from the same sender replaces the first.
    pub fn store(&mut self, from: NodeId, qubit: Qubit) -> Result<(), EntanglementError> {
        if self.is_full() {
            return Err(EntanglementError::MemoryFull {
                node: self.node.clone(),
                capacity: self.capacity,
            });
        }
        match self.slots.iter_mut().find(|(sender, _)| *sender == from) {
            Some(slot) => slot.1 = qubit,
            None => self.slots.push((from, qubit)),
        }
        Ok(())
    }

    /// Remove the two oldest entries, leaving the memory empty.
    pub fn take_pair(&mut self) -> Option<((NodeId, Qubit), (NodeId, Qubit))> {
        if self.slots.len() < 2 {
            return None;
        }
        let mut slots = std::mem::take(&mut self.slots).into_iter();
        let first = slots.next()?;
        let second = slots.next()?;
        Some((first, second))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
