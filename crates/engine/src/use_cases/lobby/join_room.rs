//! Joining a waiting room by id or join code.

use std::sync::Arc;

use quizlobby_domain::{
    MemberRole, Membership, PasswordHash, RoomCode, RoomEventPayload, RoomId,
};

use super::context::{require_waiting, LobbyContext};
use super::error::{BadRequestReason, ConflictReason, LobbyError, NotFoundReason};
use super::types::{JoinTarget, LobbyUser, RoomView};
use crate::infrastructure::password::verify_password_blocking;

pub struct JoinRoom {
    ctx: Arc<LobbyContext>,
}

impl JoinRoom {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        target: JoinTarget,
        user: &LobbyUser,
        password: Option<&str>,
    ) -> Result<RoomView, LobbyError> {
        let room_id = self.resolve(target).await?;
        let verified = self.verify_unlocked(room_id, password).await?;
        let _guard = self.ctx.lock(room_id).await?;

        let room = self.ctx.load_room(room_id).await?;
        require_waiting(&room)?;

        if let Some(current) = self.ctx.members.find_active_by_user(user.user_id).await? {
            let reason = if current.room_id() == room_id {
                ConflictReason::AlreadyMember
            } else {
                ConflictReason::AlreadyInAnotherRoom
            };
            return Err(LobbyError::Conflict(reason));
        }

        if let Some(hash) = room.password_hash() {
            let matches = match (password, verified) {
                (_, Some((checked, matched))) if &checked == hash => matched,
                // The password changed since the unlocked check.
                (Some(candidate), _) => {
                    verify_password_blocking(candidate.to_string(), hash.clone()).await
                }
                (None, _) => false,
            };
            if !matches {
                tracing::info!(room_id = %room_id, user_id = %user.user_id, "Join rejected: wrong password");
                return Err(LobbyError::BadRequest(BadRequestReason::WrongPassword));
            }
        }

        let active = self.ctx.members.count_active(room_id).await?;
        if room.is_full(active) {
            return Err(LobbyError::Conflict(ConflictReason::RoomFull));
        }

        let membership = Membership::new(
            self.ctx.new_membership_id(),
            room_id,
            user.user_id,
            user.username.clone(),
            MemberRole::Player,
            self.ctx.now(),
        )
        .with_avatar_url(user.avatar_url.clone());
        self.ctx.members.insert(&membership).await?;

        let view = self.ctx.view(room).await?;
        let current_players = view.current_players();
        tracing::info!(
            room_id = %room_id,
            user_id = %user.user_id,
            current_players,
            "Player joined room"
        );
        self.ctx.metrics.player_joined();
        self.ctx.reindex(&view, &[]);

        self.ctx.emit(
            room_id,
            RoomEventPayload::PlayerJoined {
                user_id: user.user_id,
                username: user.username.clone(),
                avatar_url: user.avatar_url.clone(),
                current_players,
            },
        );
        self.ctx
            .durable
            .player_joined(&view.room, &membership, current_players);

        Ok(view)
    }

    /// Check `password` against the room's current hash without holding the
    /// token. Returns the hash checked and the verdict, reused under the token
    /// while the hash is unchanged.
    async fn verify_unlocked(
        &self,
        room_id: RoomId,
        password: Option<&str>,
    ) -> Result<Option<(PasswordHash, bool)>, LobbyError> {
        let Some(candidate) = password else {
            return Ok(None);
        };
        let hash = self
            .ctx
            .rooms
            .get_for_update(room_id)
            .await?
            .and_then(|room| room.password_hash().cloned());
        let Some(hash) = hash else {
            return Ok(None);
        };
        let matches = verify_password_blocking(candidate.to_string(), hash.clone()).await;
        Ok(Some((hash, matches)))
    }

    async fn resolve(&self, target: JoinTarget) -> Result<RoomId, LobbyError> {
        match target {
            JoinTarget::Id(room_id) => Ok(room_id),
            JoinTarget::Code(raw) => {
                let code = RoomCode::new(raw.as_str())
                    .map_err(|_| LobbyError::NotFound(NotFoundReason::RoomCode(raw.clone())))?;
                self.ctx
                    .rooms
                    .find_open_by_code(&code)
                    .await?
                    .map(|room| room.id())
                    .ok_or(LobbyError::NotFound(NotFoundReason::RoomCode(raw)))
            }
        }
    }
}
