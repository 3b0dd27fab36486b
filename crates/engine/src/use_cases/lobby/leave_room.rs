//! Leaving a room and being kicked from one.
//!
//! Both paths close one membership. When the closed membership was the host
//! the longest-tenured remaining member is promoted in the same transaction.
//! A waiting room whose last member leaves is cancelled.

use std::sync::Arc;

use quizlobby_domain::{
    longest_tenured, CloseReason, LeaveReason, MemberRole, Membership, Room, RoomEventPayload,
    RoomId, UserId,
};

use super::context::{require_host, require_waiting, LobbyContext};
use super::durable_events::CANCEL_REASON_NO_PLAYERS;
use super::error::{ForbiddenReason, LobbyError, NotFoundReason};

pub struct LeaveRoom {
    ctx: Arc<LobbyContext>,
}

impl LeaveRoom {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(&self, room_id: RoomId, user_id: UserId) -> Result<(), LobbyError> {
        let _guard = self.ctx.lock(room_id).await?;

        let room = self.ctx.load_room(room_id).await?;
        if room.status().is_terminal() {
            return Err(LobbyError::invalid_state(room.status()));
        }
        let member = self
            .ctx
            .members
            .get_active(room_id, user_id)
            .await?
            .ok_or(LobbyError::NotFound(NotFoundReason::PlayerNotInRoom))?;

        remove_member(&self.ctx, room, member, LeaveReason::Left).await
    }
}

pub struct KickPlayer {
    ctx: Arc<LobbyContext>,
}

impl KickPlayer {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        room_id: RoomId,
        host_id: UserId,
        target_id: UserId,
    ) -> Result<(), LobbyError> {
        let _guard = self.ctx.lock(room_id).await?;

        let room = self.ctx.load_room(room_id).await?;
        require_host(&room, host_id)?;
        require_waiting(&room)?;
        if target_id == host_id {
            return Err(LobbyError::Forbidden(ForbiddenReason::CannotKickSelf));
        }
        let target = self
            .ctx
            .members
            .get_active(room_id, target_id)
            .await?
            .ok_or(LobbyError::NotFound(NotFoundReason::PlayerNotInRoom))?;
        if target.is_host() {
            return Err(LobbyError::Forbidden(ForbiddenReason::CannotKickHost));
        }

        tracing::info!(room_id = %room_id, host_id = %host_id, target_id = %target_id, "Kicking player");
        remove_member(&self.ctx, room, target, LeaveReason::Kicked).await
    }
}

/// Close `member`'s stay in `room`. Caller holds the room token.
async fn remove_member(
    ctx: &LobbyContext,
    mut room: Room,
    mut member: Membership,
    reason: LeaveReason,
) -> Result<(), LobbyError> {
    let now = ctx.now();
    let room_id = room.id();
    let mut remaining: Vec<Membership> = ctx
        .members
        .list_active(room_id)
        .await?
        .into_iter()
        .filter(|m| m.id() != member.id())
        .collect();

    member.leave(now)?;
    let departed = [member.user_id()];

    if remaining.is_empty() && room.is_waiting() {
        room.cancel(now)?;
        ctx.rooms
            .save_with_members(&room, std::slice::from_ref(&member))
            .await?;

        tracing::info!(room_id = %room_id, user_id = %member.user_id(), "Last player left, room cancelled");
        ctx.metrics.player_left();
        ctx.metrics.room_cancelled();
        ctx.index.room_closed(room_id, &departed);

        ctx.emit(room_id, left_payload(&member, reason, 0));
        ctx.emit(
            room_id,
            RoomEventPayload::RoomClosed {
                reason: CloseReason::NoPlayers,
            },
        );
        ctx.live.close_room(room_id);

        ctx.durable
            .player_left(room_id, member.user_id(), member.username(), reason, 0);
        ctx.durable.room_cancelled(room_id, CANCEL_REASON_NO_PLAYERS);
        return Ok(());
    }

    let successor = if member.is_host() {
        longest_tenured(&remaining).map(Membership::id)
    } else {
        None
    };

    match successor.and_then(|id| remaining.iter_mut().find(|m| m.id() == id)) {
        Some(heir) => {
            heir.set_role(MemberRole::Host);
            room.change_host(heir.user_id(), now);
            tracing::info!(room_id = %room_id, new_host_id = %heir.user_id(), "Host role passed on");
            let changed = [member.clone(), heir.clone()];
            ctx.rooms.save_with_members(&room, &changed).await?;
        }
        None => ctx.members.save(&member).await?,
    }

    let view = ctx.view(room).await?;
    let current_players = view.current_players();
    tracing::info!(
        room_id = %room_id,
        user_id = %member.user_id(),
        reason = reason.as_str(),
        current_players,
        "Player left room"
    );
    ctx.metrics.player_left();
    ctx.reindex(&view, &departed);

    ctx.emit(room_id, left_payload(&member, reason, current_players));
    ctx.durable.player_left(
        room_id,
        member.user_id(),
        member.username(),
        reason,
        current_players,
    );
    Ok(())
}

fn left_payload(member: &Membership, reason: LeaveReason, current_players: u32) -> RoomEventPayload {
    RoomEventPayload::PlayerLeft {
        user_id: member.user_id(),
        username: member.username().to_string(),
        reason,
        current_players,
    }
}
