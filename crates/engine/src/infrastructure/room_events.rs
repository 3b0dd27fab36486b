//! Live per-room event fan-out.
//!
//! Each room with at least one subscriber owns a channel holding one bounded
//! queue per subscriber. Publishing never waits: an event is delivered to
//! every subscriber or to none, and the outcome is counted.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures_util::Stream;
use quizlobby_domain::{DomainEvent, RoomId};
use tokio::sync::mpsc;

/// Outcome of a single publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Nobody was listening.
    Dropped,
    /// A subscriber was full, or the channel closed under us.
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoomEventStats {
    pub published: u64,
    pub dropped: u64,
    pub failed: u64,
    pub active_channels: usize,
}

#[derive(Default)]
struct ChannelState {
    subscribers: Vec<mpsc::Sender<DomainEvent>>,
    closed: bool,
}

#[derive(Default)]
struct RoomChannel {
    state: Mutex<ChannelState>,
}

impl RoomChannel {
    fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct RoomEventPublisher {
    channels: DashMap<RoomId, Arc<RoomChannel>>,
    capacity: usize,
    published: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

impl RoomEventPublisher {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    fn channel(&self, room_id: RoomId) -> Arc<RoomChannel> {
        Arc::clone(self.channels.entry(room_id).or_default().value())
    }

    /// Start receiving events published to `room_id` from now on.
    pub fn subscribe(&self, room_id: RoomId) -> RoomEventStream {
        let (tx, rx) = mpsc::channel(self.capacity);
        loop {
            let channel = self.channel(room_id);
            let mut state = channel.lock();
            if state.closed {
                // Closed between lookup and lock; the map no longer holds it.
                drop(state);
                self.channels
                    .remove_if(&room_id, |_, current| Arc::ptr_eq(current, &channel));
                continue;
            }
            state.subscribers.push(tx);
            tracing::debug!(room_id = %room_id, subscribers = state.subscribers.len(), "Live subscriber added");
            return RoomEventStream { room_id, rx };
        }
    }

    pub fn publish(&self, event: DomainEvent) -> PublishOutcome {
        let room_id = event.room_id;
        let Some(channel) = self.channels.get(&room_id).map(|c| Arc::clone(c.value())) else {
            return self.record(PublishOutcome::Dropped);
        };

        match self.try_deliver(room_id, &channel, &event) {
            Some(outcome) => self.record(outcome),
            None => {
                tracing::debug!(room_id = %room_id, "Channel closed during publish, retrying once");
                self.channels
                    .remove_if(&room_id, |_, current| Arc::ptr_eq(current, &channel));
                let fresh = self.channel(room_id);
                let outcome = self
                    .try_deliver(room_id, &fresh, &event)
                    .unwrap_or(PublishOutcome::Failed);
                self.record(outcome)
            }
        }
    }

    /// `None` when the channel was already closed.
    fn try_deliver(
        &self,
        room_id: RoomId,
        channel: &Arc<RoomChannel>,
        event: &DomainEvent,
    ) -> Option<PublishOutcome> {
        let mut state = channel.lock();
        if state.closed {
            return None;
        }

        state.subscribers.retain(|tx| !tx.is_closed());
        if state.subscribers.is_empty() {
            state.closed = true;
            drop(state);
            self.channels
                .remove_if(&room_id, |_, current| Arc::ptr_eq(current, channel));
            return Some(PublishOutcome::Dropped);
        }

        if state.subscribers.iter().any(|tx| tx.capacity() == 0) {
            tracing::warn!(
                room_id = %room_id,
                event_type = event.event_type(),
                "Live subscriber buffer full, event not delivered"
            );
            return Some(PublishOutcome::Failed);
        }

        // Capacity was checked under the lock and only grows, so every send fits.
        for tx in &state.subscribers {
            let _ = tx.try_send(event.clone());
        }
        Some(PublishOutcome::Published)
    }

    fn record(&self, outcome: PublishOutcome) -> PublishOutcome {
        let counter = match outcome {
            PublishOutcome::Published => &self.published,
            PublishOutcome::Dropped => &self.dropped,
            PublishOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        outcome
    }

    /// End every subscriber's stream for `room_id`. Buffered events are still delivered.
    pub fn close_room(&self, room_id: RoomId) {
        if let Some((_, channel)) = self.channels.remove(&room_id) {
            let mut state = channel.lock();
            state.closed = true;
            let subscribers = state.subscribers.len();
            state.subscribers.clear();
            tracing::debug!(room_id = %room_id, subscribers, "Live channel closed");
        }
    }

    pub fn subscriber_count(&self, room_id: RoomId) -> usize {
        self.channels
            .get(&room_id)
            .map(|channel| {
                channel
                    .lock()
                    .subscribers
                    .iter()
                    .filter(|tx| !tx.is_closed())
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn stats(&self) -> RoomEventStats {
        RoomEventStats {
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            active_channels: self.channels.len(),
        }
    }
}

/// Events for one room, in publish order. Ends when the room is closed.
pub struct RoomEventStream {
    room_id: RoomId,
    rx: mpsc::Receiver<DomainEvent>,
}

impl RoomEventStream {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub async fn recv(&mut self) -> Option<DomainEvent> {
        self.rx.recv().await
    }

    /// Next already-buffered event, if any.
    pub fn try_recv(&mut self) -> Option<DomainEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for RoomEventStream {
    type Item = DomainEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures_util::StreamExt;
    use quizlobby_domain::{CloseReason, RoomEventPayload};

    fn closed_event(room_id: RoomId) -> DomainEvent {
        DomainEvent::new(
            room_id,
            Utc::now(),
            RoomEventPayload::RoomClosed {
                reason: CloseReason::Cancelled,
            },
        )
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let publisher = RoomEventPublisher::new(100);
        let outcome = publisher.publish(closed_event(RoomId::new()));
        assert_eq!(outcome, PublishOutcome::Dropped);
        assert_eq!(publisher.stats().dropped, 1);
    }

    #[tokio::test]
    async fn every_subscriber_sees_events_in_order() {
        let publisher = RoomEventPublisher::new(100);
        let room_id = RoomId::new();
        let mut first = publisher.subscribe(room_id);
        let mut second = publisher.subscribe(room_id);

        let a = closed_event(room_id);
        let b = DomainEvent::new(
            room_id,
            Utc::now(),
            RoomEventPayload::RoomClosed {
                reason: CloseReason::Finished,
            },
        );
        assert_eq!(publisher.publish(a.clone()), PublishOutcome::Published);
        assert_eq!(publisher.publish(b.clone()), PublishOutcome::Published);

        assert_eq!(first.recv().await, Some(a.clone()));
        assert_eq!(first.recv().await, Some(b.clone()));
        assert_eq!(second.recv().await, Some(a));
        assert_eq!(second.recv().await, Some(b));
        assert_eq!(publisher.stats().published, 2);
    }

    #[test]
    fn slow_subscriber_makes_publish_fail() {
        let publisher = RoomEventPublisher::new(100);
        let room_id = RoomId::new();
        let _slow = publisher.subscribe(room_id);

        let outcomes: Vec<_> = (0..101)
            .map(|_| publisher.publish(closed_event(room_id)))
            .collect();

        assert!(outcomes[..100].iter().all(|o| *o == PublishOutcome::Published));
        assert_eq!(outcomes[100], PublishOutcome::Failed);
        assert!(publisher.stats().failed >= 1);
    }

    #[test]
    fn full_subscriber_blocks_delivery_to_all() {
        let publisher = RoomEventPublisher::new(1);
        let room_id = RoomId::new();
        let _slow = publisher.subscribe(room_id);
        assert_eq!(publisher.publish(closed_event(room_id)), PublishOutcome::Published);

        let mut fast = publisher.subscribe(room_id);
        assert_eq!(publisher.publish(closed_event(room_id)), PublishOutcome::Failed);
        assert_eq!(fast.try_recv(), None);
    }

    #[tokio::test]
    async fn close_room_ends_streams_and_resets_channel() {
        let publisher = RoomEventPublisher::new(100);
        let room_id = RoomId::new();
        let mut stream = publisher.subscribe(room_id);
        let event = closed_event(room_id);
        publisher.publish(event.clone());

        publisher.close_room(room_id);
        assert_eq!(publisher.stats().active_channels, 0);
        assert_eq!(stream.next().await, Some(event));
        assert_eq!(stream.next().await, None);

        let mut late = publisher.subscribe(room_id);
        assert_eq!(publisher.publish(closed_event(room_id)), PublishOutcome::Published);
        assert!(late.try_recv().is_some());
    }

    #[test]
    fn departed_subscribers_are_pruned() {
        let publisher = RoomEventPublisher::new(100);
        let room_id = RoomId::new();
        let stream = publisher.subscribe(room_id);
        assert_eq!(publisher.subscriber_count(room_id), 1);
        drop(stream);

        assert_eq!(publisher.publish(closed_event(room_id)), PublishOutcome::Dropped);
        assert_eq!(publisher.stats().active_channels, 0);
    }

    #[test]
    fn closed_channel_is_replaced_and_retry_is_counted() {
        let publisher = RoomEventPublisher::new(100);
        let room_id = RoomId::new();
        let _stream = publisher.subscribe(room_id);

        // Simulate close racing with publish: the map still points at a closed channel.
        let channel = publisher.channel(room_id);
        channel.lock().closed = true;

        assert_eq!(publisher.publish(closed_event(room_id)), PublishOutcome::Dropped);
        let stats = publisher.stats();
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.failed, 0);
    }
}
