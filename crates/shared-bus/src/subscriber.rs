//! # Event Subscriber
//!
//! Reading side of the bus. A [`Subscription`] drains its backlog (journal
//! snapshot taken when it was opened, possibly empty) before any live event,
//! so consumers observe one gap-free, sequence-ordered stream unless they fall
//! more than the bus capacity behind.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::events::{EventFilter, SimulationEvent};
use crate::publisher::{InMemoryEventBus, TopicCounts};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

/// Anything that hands out filtered subscriptions.
pub trait EventSubscriber: Send + Sync {
    /// Live events only.
    fn subscribe(&self, filter: EventFilter) -> Subscription;

    /// History first, then live events.
    fn follow(&self, filter: EventFilter) -> Subscription;
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::subscribe(self, filter)
    }

    fn follow(&self, filter: EventFilter) -> Subscription {
        InMemoryEventBus::follow(self, filter)
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<SimulationEvent>,
    filter: EventFilter,
    backlog: VecDeque<SimulationEvent>,
    /// Highest sequence handed out; guards against replaying backlog twice.
    last_sequence: u64,
    missed: u64,
    topics: TopicCounts,
}

impl Subscription {
    pub(crate) fn new(
        receiver: broadcast::Receiver<SimulationEvent>,
        filter: EventFilter,
        backlog: Vec<SimulationEvent>,
        topics: TopicCounts,
    ) -> Self {
        Self {
            receiver,
            filter,
            backlog: backlog.into(),
            last_sequence: 0,
            missed: 0,
            topics,
        }
    }

    /// Next matching event. `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<SimulationEvent> {
        if let Some(event) = self.next_backlogged() {
            return Some(event);
        }
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if let Some(event) = self.accept(event) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => self.lagged(count),
            }
        }
    }

    /// Next matching event if one is ready.
    ///
    /// `Ok(None)` means nothing is ready yet.
    pub fn try_recv(&mut self) -> Result<Option<SimulationEvent>, SubscriptionError> {
        if let Some(event) = self.next_backlogged() {
            return Ok(Some(event));
        }
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if let Some(event) = self.accept(event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(count)) => self.lagged(count),
            }
        }
    }

    /// Events skipped because this subscriber fell behind. Anything missed is
    /// still in [`InMemoryEventBus::history`].
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }

    #[must_use]
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    fn next_backlogged(&mut self) -> Option<SimulationEvent> {
        let event = self.backlog.pop_front()?;
        self.last_sequence = event.sequence;
        Some(event)
    }

    fn accept(&mut self, event: SimulationEvent) -> Option<SimulationEvent> {
        if event.sequence <= self.last_sequence || !self.filter.matches(&event) {
            return None;
        }
        self.last_sequence = event.sequence;
        Some(event)
    }

    fn lagged(&mut self, count: u64) {
        self.missed += count;
        warn!(lagged = count, total = self.missed, "Subscriber fell behind, events skipped");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut topics = self.topics.write();
        let Some(count) = topics.get_mut(&self.filter.topics) else {
            return;
        };
        *count = count.saturating_sub(1);
        if *count == 0 {
            topics.remove(&self.filter.topics);
        }
        debug!(topics = ?self.filter.topics, "Subscription dropped");
    }
}

/// A [`Subscription`] as a `tokio_stream::Stream`.
pub struct EventStream {
    subscription: Subscription,
}

impl EventStream {
    #[must_use]
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    /// Named apart from `StreamExt::filter`, which would otherwise shadow it.
    #[must_use]
    pub fn event_filter(&self) -> &EventFilter {
        self.subscription.filter()
    }

    #[must_use]
    pub fn missed(&self) -> u64 {
        self.subscription.missed()
    }
}

impl Stream for EventStream {
    type Item = SimulationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.subscription.try_recv() {
            Ok(Some(event)) => Poll::Ready(Some(event)),
            Ok(None) => {
                // broadcast::Receiver has no poll API; re-poll on the next turn.
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(SubscriptionError::Closed) => Poll::Ready(None),
        }
    }
}

/// Count of events per type, handy for summaries of a finished run.
#[must_use]
pub fn tally(events: &[SimulationEvent]) -> HashMap<crate::events::EventType, usize> {
    let mut counts = HashMap::new();
    for event in events {
        *counts.entry(event.event_type).or_insert(0) += 1;
    }
    counts
}
