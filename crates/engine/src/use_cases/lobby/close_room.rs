//! Terminal transitions: host cancellation and game completion.

use std::sync::Arc;

use quizlobby_domain::{CloseReason, Room, RoomEventPayload, RoomId, RoomStatus, UserId};

use super::context::{require_host, require_waiting, LobbyContext};
use super::durable_events::CANCEL_REASON_MANUAL;
use super::error::LobbyError;

pub struct CancelRoom {
    ctx: Arc<LobbyContext>,
}

impl CancelRoom {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(&self, room_id: RoomId, user_id: UserId) -> Result<(), LobbyError> {
        let _guard = self.ctx.lock(room_id).await?;

        let mut room = self.ctx.load_room(room_id).await?;
        require_host(&room, user_id)?;
        require_waiting(&room)?;

        room.cancel(self.ctx.now())?;
        close(&self.ctx, room, CloseReason::Cancelled).await?;

        tracing::info!(room_id = %room_id, host_id = %user_id, "Room cancelled by host");
        self.ctx.metrics.room_cancelled();
        self.ctx.durable.room_cancelled(room_id, CANCEL_REASON_MANUAL);
        Ok(())
    }
}

/// Called when the game service reports a session as over.
pub struct FinishGame {
    ctx: Arc<LobbyContext>,
}

impl FinishGame {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(&self, room_id: RoomId) -> Result<(), LobbyError> {
        let _guard = self.ctx.lock(room_id).await?;

        let mut room = self.ctx.load_room(room_id).await?;
        if room.status() != RoomStatus::Playing {
            return Err(LobbyError::invalid_state(room.status()));
        }

        room.finish(self.ctx.now())?;
        close(&self.ctx, room, CloseReason::Finished).await?;

        tracing::info!(room_id = %room_id, "Game finished");
        self.ctx.metrics.room_finished();
        self.ctx.durable.room_finished(room_id);
        Ok(())
    }
}

/// Persist a terminal `room` together with the closing of its memberships.
async fn close(ctx: &LobbyContext, room: Room, reason: CloseReason) -> Result<(), LobbyError> {
    let room_id = room.id();
    let mut members = ctx.members.list_active(room_id).await?;
    let departed = LobbyContext::close_all(&mut members, ctx.now());
    ctx.rooms.save_with_members(&room, &members).await?;

    ctx.index.room_closed(room_id, &departed);
    ctx.emit(room_id, RoomEventPayload::RoomClosed { reason });
    ctx.live.close_room(room_id);
    Ok(())
}
