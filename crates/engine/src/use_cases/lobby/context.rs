//! Dependencies and helpers shared by every lobby operation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quizlobby_domain::{
    DomainEvent, Membership, MembershipId, Room, RoomEventPayload, RoomId, RoomStatus, UserId,
};

use super::durable_events::DurableEventPublisher;
use super::error::{LobbyError, NotFoundReason};
use super::types::RoomView;
use crate::infrastructure::metrics::LobbyMetrics;
use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::infrastructure::room_events::RoomEventPublisher;
use crate::infrastructure::room_locks::{RoomGuard, RoomLocks};
use crate::repositories::{MembershipRepository, RoomIndex, RoomRepository, SettingsRepository};

/// Tunables the lobby rules depend on.
#[derive(Debug, Clone)]
pub struct LobbyPolicy {
    pub max_players_limit: u32,
    pub lock_timeout: Duration,
}

impl Default for LobbyPolicy {
    fn default() -> Self {
        Self {
            max_players_limit: 12,
            lock_timeout: Duration::from_secs(10),
        }
    }
}

pub struct LobbyContext {
    pub rooms: Arc<RoomRepository>,
    pub members: Arc<MembershipRepository>,
    pub settings: Arc<SettingsRepository>,
    pub index: RoomIndex,
    pub locks: RoomLocks,
    pub live: Arc<RoomEventPublisher>,
    pub durable: Arc<DurableEventPublisher>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
    pub metrics: Arc<LobbyMetrics>,
    pub policy: LobbyPolicy,
}

impl LobbyContext {
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn new_membership_id(&self) -> MembershipId {
        MembershipId::from_uuid(self.random.gen_uuid())
    }

    pub fn new_room_id(&self) -> RoomId {
        RoomId::from_uuid(self.random.gen_uuid())
    }

    /// Serialize with every other lifecycle operation on `room_id`.
    pub async fn lock(&self, room_id: RoomId) -> Result<RoomGuard, LobbyError> {
        self.locks
            .acquire(room_id, self.policy.lock_timeout)
            .await
            .map_err(|_| LobbyError::Conflict(super::error::ConflictReason::RoomBusy))
    }

    /// Durable read of a room about to be mutated. The caller must hold its
    /// token.
    ///
    /// No start is in flight while the token is held, so a STARTING room was
    /// left behind by a start whose rollback never landed. It is put back to
    /// WAITING first; a later start reuses the same idempotency key.
    pub async fn load_room(&self, room_id: RoomId) -> Result<Room, LobbyError> {
        let mut room = self
            .rooms
            .get_for_update(room_id)
            .await?
            .ok_or(LobbyError::NotFound(NotFoundReason::Room))?;
        if room.status() == RoomStatus::Starting {
            tracing::warn!(room_id = %room_id, "Recovering room abandoned in starting state");
            room.revert_start(self.now())?;
            self.rooms.save(&room).await?;
            self.metrics.start_recovered();
        }
        Ok(room)
    }

    /// Committed state of `room`, read from the durable store.
    pub async fn view(&self, room: Room) -> Result<RoomView, LobbyError> {
        let members = self.members.list_active(room.id()).await?;
        let settings = self
            .settings
            .get_for_update(room.id())
            .await?
            .ok_or_else(|| {
                tracing::error!(room_id = %room.id(), "Room has no settings row");
                LobbyError::Internal(format!("settings missing for room {}", room.id()))
            })?;
        Ok(RoomView {
            room,
            members,
            settings,
        })
    }

    /// Refresh the advisory indices after a committed change.
    pub fn reindex(&self, view: &RoomView, departed: &[UserId]) {
        self.index.room_changed(&view.room, &view.members, departed);
    }

    pub fn emit(&self, room_id: RoomId, payload: RoomEventPayload) {
        let event = DomainEvent::new(room_id, self.now(), payload);
        self.live.publish(event);
    }

    /// Close every active membership of a room ending for good.
    pub fn close_all(members: &mut [Membership], now: DateTime<Utc>) -> Vec<UserId> {
        members
            .iter_mut()
            .filter(|m| m.is_active())
            .filter_map(|m| m.leave(now).ok().map(|_| m.user_id()))
            .collect()
    }
}

/// Host check shared by host-only operations.
pub fn require_host(room: &Room, user_id: UserId) -> Result<(), LobbyError> {
    if room.is_host(user_id) {
        Ok(())
    } else {
        Err(LobbyError::Forbidden(super::error::ForbiddenReason::NotHost))
    }
}

pub fn require_waiting(room: &Room) -> Result<(), LobbyError> {
    if room.is_waiting() {
        Ok(())
    } else {
        Err(LobbyError::invalid_state(room.status()))
    }
}
