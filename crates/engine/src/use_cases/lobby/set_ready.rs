//! Ready flags, with auto-start once everyone is ready.

use std::sync::Arc;

use quizlobby_domain::{RoomEventPayload, RoomId, UserId, MIN_PLAYERS};

use super::context::{require_waiting, LobbyContext};
use super::error::{LobbyError, NotFoundReason};
use super::start_game::{StartGame, StartedGame};

#[derive(Debug, Clone, PartialEq)]
pub struct ReadyOutcome {
    pub is_ready: bool,
    pub all_players_ready: bool,
    pub ready_count: u32,
    pub total_count: u32,
    /// Set when this change triggered the game start.
    pub game: Option<StartedGame>,
}

pub struct SetReady {
    ctx: Arc<LobbyContext>,
    start: Arc<StartGame>,
}

impl SetReady {
    pub fn new(ctx: Arc<LobbyContext>, start: Arc<StartGame>) -> Self {
        Self { ctx, start }
    }

    pub async fn execute(
        &self,
        room_id: RoomId,
        user_id: UserId,
        is_ready: bool,
    ) -> Result<ReadyOutcome, LobbyError> {
        let _guard = self.ctx.lock(room_id).await?;

        let room = self.ctx.load_room(room_id).await?;
        require_waiting(&room)?;
        let mut member = self
            .ctx
            .members
            .get_active(room_id, user_id)
            .await?
            .ok_or(LobbyError::NotFound(NotFoundReason::PlayerNotInRoom))?;

        if member.is_ready() != is_ready {
            member.set_ready(is_ready);
            self.ctx.members.save(&member).await?;
        }

        let members = self.ctx.members.list_active(room_id).await?;
        let total_count = members.len() as u32;
        let ready_count = members.iter().filter(|m| m.is_ready()).count() as u32;
        let all_players_ready = total_count > 0 && ready_count == total_count;

        tracing::debug!(room_id = %room_id, user_id = %user_id, is_ready, ready_count, total_count, "Ready state changed");
        self.ctx.emit(
            room_id,
            RoomEventPayload::PlayerReady {
                user_id,
                is_ready,
                all_players_ready,
                ready_count,
                total_count,
            },
        );

        let game = if all_players_ready && total_count >= MIN_PLAYERS {
            tracing::info!(room_id = %room_id, total_count, "All players ready, starting game");
            Some(self.start.start_locked(room).await?)
        } else {
            None
        };

        Ok(ReadyOutcome {
            is_ready,
            all_players_ready,
            ready_count,
            total_count,
            game,
        })
    }
}
