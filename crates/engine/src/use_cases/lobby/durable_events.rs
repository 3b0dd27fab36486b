//! Best-effort publication of lobby events to the broker.
//!
//! Records are queued in call order and sent one at a time from the
//! background pool, so a room's records reach the broker in the order its
//! operations committed. A broker failure is logged and counted and never
//! reaches the caller.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use quizlobby_domain::{LeaveReason, Membership, Room, RoomId, UserId};
use quizlobby_shared::{BrokerEventType, BrokerRecord};

use crate::infrastructure::background::BackgroundTasks;
use crate::infrastructure::metrics::LobbyMetrics;
use crate::infrastructure::ports::{BrokerPort, RosterEntry};

/// Broker `reason` for a host-initiated cancellation.
pub const CANCEL_REASON_MANUAL: &str = "manual";
/// Broker `reason` when the last member left.
pub const CANCEL_REASON_NO_PLAYERS: &str = "no_players";

/// Records held while the broker is slow. Older records are dropped past this.
const MAX_PENDING: usize = 1024;

struct Pending {
    key: String,
    event_type: BrokerEventType,
    payload: String,
}

#[derive(Default)]
struct Outbox {
    queue: VecDeque<Pending>,
    draining: bool,
}

pub struct DurableEventPublisher {
    broker: Arc<dyn BrokerPort>,
    topic: String,
    tasks: BackgroundTasks,
    metrics: Arc<LobbyMetrics>,
    outbox: Arc<Mutex<Outbox>>,
}

fn lock(outbox: &Mutex<Outbox>) -> MutexGuard<'_, Outbox> {
    outbox.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DurableEventPublisher {
    pub fn new(
        broker: Arc<dyn BrokerPort>,
        topic: impl Into<String>,
        tasks: BackgroundTasks,
        metrics: Arc<LobbyMetrics>,
    ) -> Self {
        Self {
            broker,
            topic: topic.into(),
            tasks,
            metrics,
            outbox: Arc::new(Mutex::new(Outbox::default())),
        }
    }

    pub fn room_created(&self, room: &Room, host_username: &str, pack_name: Option<&str>) {
        self.publish(
            BrokerRecord::new(BrokerEventType::RoomCreated, room.id().to_uuid())
                .with("room_id", room.id())
                .with("room_code", room.code())
                .with("host_id", room.host_id())
                .with("host_username", host_username)
                .with("pack_id", room.pack_id())
                .with("pack_name", pack_name.unwrap_or("Unknown"))
                .with("max_players", room.max_players())
                .with("is_public", room.is_public()),
        );
    }

    pub fn player_joined(&self, room: &Room, member: &Membership, current_players: u32) {
        self.publish(
            BrokerRecord::new(BrokerEventType::PlayerJoined, room.id().to_uuid())
                .with("room_id", room.id())
                .with("user_id", member.user_id())
                .with("username", member.username())
                .with("avatar_url", member.avatar_url().unwrap_or_default())
                .with("current_players", current_players)
                .with("max_players", room.max_players()),
        );
    }

    pub fn player_left(
        &self,
        room_id: RoomId,
        user_id: UserId,
        username: &str,
        reason: LeaveReason,
        current_players: u32,
    ) {
        self.publish(
            BrokerRecord::new(BrokerEventType::PlayerLeft, room_id.to_uuid())
                .with("room_id", room_id)
                .with("user_id", user_id)
                .with("username", username)
                .with("reason", reason.as_str())
                .with("current_players", current_players),
        );
    }

    pub fn room_started(&self, room: &Room, game_session_id: &str, roster: &[RosterEntry]) {
        let players = match serde_json::to_string(roster) {
            Ok(players) => players,
            Err(e) => {
                tracing::warn!(room_id = %room.id(), error = %e, "Could not encode roster for broker");
                "[]".to_string()
            }
        };
        self.publish(
            BrokerRecord::new(BrokerEventType::RoomStarted, room.id().to_uuid())
                .with("room_id", room.id())
                .with("game_id", game_session_id)
                .with("pack_id", room.pack_id())
                .with("player_count", roster.len())
                .with("players", players),
        );
    }

    pub fn room_finished(&self, room_id: RoomId) {
        self.publish(
            BrokerRecord::new(BrokerEventType::RoomFinished, room_id.to_uuid())
                .with("room_id", room_id),
        );
    }

    pub fn room_cancelled(&self, room_id: RoomId, reason: &str) {
        self.publish(
            BrokerRecord::new(BrokerEventType::RoomCancelled, room_id.to_uuid())
                .with("room_id", room_id)
                .with("reason", reason),
        );
    }

    fn publish(&self, record: BrokerRecord) {
        let payload = match serde_json::to_string(&record) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(event_type = %record.event_type, error = %e, "Failed to encode broker record");
                self.metrics.broker_failed();
                return;
            }
        };

        let mut outbox = lock(&self.outbox);
        if outbox.queue.len() >= MAX_PENDING {
            if let Some(dropped) = outbox.queue.pop_front() {
                tracing::error!(event_type = %dropped.event_type, room_id = %dropped.key, "Broker outbox full, dropping oldest record");
                self.metrics.broker_failed();
            }
        }
        outbox.queue.push_back(Pending {
            key: record.key(),
            event_type: record.event_type,
            payload,
        });
        if outbox.draining {
            return;
        }

        let broker = Arc::clone(&self.broker);
        let metrics = Arc::clone(&self.metrics);
        let topic = self.topic.clone();
        let queue = Arc::clone(&self.outbox);
        // A dropped drain leaves the records queued for the next publish.
        outbox.draining = self
            .tasks
            .spawn("broker_publish", drain(broker, topic, queue, metrics));
    }
}

/// Send queued records in order until the outbox is empty.
async fn drain(
    broker: Arc<dyn BrokerPort>,
    topic: String,
    outbox: Arc<Mutex<Outbox>>,
    metrics: Arc<LobbyMetrics>,
) {
    loop {
        let next = {
            let mut outbox = lock(&outbox);
            match outbox.queue.pop_front() {
                Some(next) => next,
                None => {
                    outbox.draining = false;
                    return;
                }
            }
        };

        match broker.publish(&topic, &next.key, next.payload).await {
            Ok(()) => {
                metrics.broker_published();
                tracing::debug!(event_type = %next.event_type, room_id = %next.key, "Published lobby event");
            }
            Err(e) => {
                metrics.broker_failed();
                tracing::error!(event_type = %next.event_type, room_id = %next.key, error = %e, "Failed to publish lobby event");
            }
        }
    }
}
