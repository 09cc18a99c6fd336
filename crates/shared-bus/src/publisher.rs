//! # Event Publisher
//!
//! The journal-backed bus that node workers publish into.
//!
//! Publishing stamps the next sequence number, appends to the journal and
//! broadcasts, all under the journal lock. A subscriber that snapshots the
//! journal under the same lock therefore sees every event exactly once:
//! either in its backlog or live.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::trace;

use crate::events::{EventFilter, EventTopic, SimulationEvent};
use crate::subscriber::{EventStream, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Publishing side of the bus.
///
/// Node workers only see this trait, so tests can substitute a recorder.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Append `event` to the stream.
    ///
    /// Returns the number of live subscribers that received it.
    async fn publish(&self, event: SimulationEvent) -> usize;

    /// Total events published so far.
    fn events_published(&self) -> u64;
}

/// Live subscriptions per topic set, shared with every [`Subscription`].
pub(crate) type TopicCounts = Arc<RwLock<HashMap<Vec<EventTopic>, usize>>>;

struct Journal {
    events: Vec<SimulationEvent>,
    next_sequence: u64,
}

/// In-memory bus: `tokio::sync::broadcast` for live subscribers plus an
/// append-only journal for history and late joiners.
pub struct InMemoryEventBus {
    sender: broadcast::Sender<SimulationEvent>,
    journal: Mutex<Journal>,
    topics: TopicCounts,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// `capacity` bounds how far a live subscriber may fall behind.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            journal: Mutex::new(Journal {
                events: Vec::new(),
                next_sequence: 1,
            }),
            topics: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Events published from now on that match `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let _journal = self.journal.lock();
        self.open(filter, Vec::new())
    }

    /// Every matching event already published, then the live ones.
    #[must_use]
    pub fn follow(&self, filter: EventFilter) -> Subscription {
        let journal = self.journal.lock();
        let backlog = journal
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect();
        self.open(filter, backlog)
    }

    /// [`follow`](Self::follow) as a `tokio_stream::Stream`.
    #[must_use]
    pub fn event_stream(&self, filter: EventFilter) -> EventStream {
        EventStream::new(self.follow(filter))
    }

    // Caller holds the journal lock.
    fn open(&self, filter: EventFilter, backlog: Vec<SimulationEvent>) -> Subscription {
        let receiver = self.sender.subscribe();
        *self.topics.write().entry(filter.topics.clone()).or_insert(0) += 1;
        trace!(topics = ?filter.topics, backlog = backlog.len(), "Subscription opened");
        Subscription::new(receiver, filter, backlog, Arc::clone(&self.topics))
    }

    /// Snapshot of all published events matching `filter`, oldest first.
    #[must_use]
    pub fn history(&self, filter: &EventFilter) -> Vec<SimulationEvent> {
        self.journal
            .lock()
            .events
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect()
    }

    /// Live subscriptions whose filter names exactly `topics`.
    #[must_use]
    pub fn subscriptions_for(&self, topics: &[EventTopic]) -> usize {
        self.topics.read().get(topics).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, mut event: SimulationEvent) -> usize {
        let mut journal = self.journal.lock();
        event.sequence = journal.next_sequence;
        journal.next_sequence += 1;
        journal.events.push(event.clone());

        let sequence = event.sequence;
        let event_type = event.event_type;
        // Sent under the lock so `follow` never sees an event twice.
        let receivers = self.sender.send(event).unwrap_or(0);
        drop(journal);

        trace!(sequence, event_type = ?event_type, receivers, "Event published");
        receivers
    }

    fn events_published(&self) -> u64 {
        self.journal.lock().next_sequence - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventType;
    use serde_json::json;
    use shared_types::entities::NodeId;

    fn delivered() -> SimulationEvent {
        SimulationEvent::new(EventType::PacketDelivered, NodeId::from("h2"), json!({}))
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_journaled() {
        let bus = InMemoryEventBus::new();

        assert_eq!(bus.publish(delivered()).await, 0);
        assert_eq!(bus.events_published(), 1);
        assert_eq!(bus.history(&EventFilter::all()).len(), 1);
    }

    #[tokio::test]
    async fn test_sequence_numbers_are_dense() {
        let bus = InMemoryEventBus::new();
        for _ in 0..3 {
            bus.publish(delivered()).await;
        }
        let sequences: Vec<u64> = bus
            .history(&EventFilter::all())
            .iter()
            .map(|e| e.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_subscriptions_are_counted_per_topic_set() {
        let bus = InMemoryEventBus::new();

        let _all = bus.subscribe(EventFilter::all());
        let _qkd_1 = bus.subscribe(EventFilter::topics(vec![EventTopic::Qkd]));
        let _qkd_2 = bus.follow(EventFilter::topics(vec![EventTopic::Qkd]));

        assert_eq!(bus.publish(delivered()).await, 3);
        assert_eq!(bus.subscriber_count(), 3);
        assert_eq!(bus.subscriptions_for(&[EventTopic::Qkd]), 2);
        assert_eq!(bus.subscriptions_for(&[]), 1);
        assert_eq!(bus.subscriptions_for(&[EventTopic::Routing]), 0);
    }

    #[tokio::test]
    async fn test_history_is_ordered_and_filtered() {
        let bus = InMemoryEventBus::new();
        bus.publish(SimulationEvent::new(
            EventType::DataSent,
            NodeId::from("h1"),
            json!({"seq": 1}),
        ))
        .await;
        bus.publish(SimulationEvent::new(
            EventType::QkdInitiated,
            NodeId::from("alice"),
            json!({}),
        ))
        .await;
        bus.publish(delivered()).await;

        let routing = bus.history(&EventFilter::topics(vec![EventTopic::Routing]));
        assert_eq!(routing.len(), 2);
        assert_eq!(routing[0].event_type, EventType::DataSent);
        assert_eq!(routing[1].event_type, EventType::PacketDelivered);
        assert_eq!(routing[1].sequence, 3);
    }

    #[test]
    fn test_default_bus() {
        let bus = InMemoryEventBus::default();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.events_published(), 0);
    }
}
