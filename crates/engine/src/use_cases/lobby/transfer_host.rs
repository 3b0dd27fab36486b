//! Manual host hand-over.

use std::sync::Arc;

use quizlobby_domain::{MemberRole, RoomId, UserId};

use super::context::{require_host, require_waiting, LobbyContext};
use super::error::{LobbyError, NotFoundReason};
use super::types::RoomView;

pub struct TransferHost {
    ctx: Arc<LobbyContext>,
}

impl TransferHost {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    /// Swap roles between the current host and `target_id`. No membership is closed.
    pub async fn execute(
        &self,
        room_id: RoomId,
        host_id: UserId,
        target_id: UserId,
    ) -> Result<RoomView, LobbyError> {
        let _guard = self.ctx.lock(room_id).await?;

        let mut room = self.ctx.load_room(room_id).await?;
        require_host(&room, host_id)?;
        require_waiting(&room)?;
        if target_id == host_id {
            return Err(LobbyError::invalid_input("Cannot transfer host to yourself"));
        }

        let mut target = self
            .ctx
            .members
            .get_active(room_id, target_id)
            .await?
            .ok_or(LobbyError::NotFound(NotFoundReason::PlayerNotInRoom))?;
        let mut current = self
            .ctx
            .members
            .get_active(room_id, host_id)
            .await?
            .ok_or_else(|| {
                tracing::error!(room_id = %room_id, host_id = %host_id, "Host has no active membership");
                LobbyError::Internal(format!("host of room {room_id} has no membership"))
            })?;

        current.set_role(MemberRole::Player);
        target.set_role(MemberRole::Host);
        room.change_host(target_id, self.ctx.now());
        self.ctx
            .rooms
            .save_with_members(&room, &[current, target])
            .await?;

        tracing::info!(room_id = %room_id, from = %host_id, to = %target_id, "Host transferred");

        let view = self.ctx.view(room).await?;
        self.ctx.reindex(&view, &[]);
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::lobby::error::{BadRequestReason, ForbiddenReason};
    use crate::test_fixtures::lobby::LobbyHarness;

    #[tokio::test]
    async fn swaps_roles_and_room_host() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        let guest = harness.user("guest");
        harness.join(&room, &guest).await;

        let view = harness
            .use_cases
            .lobby
            .transfer_host
            .execute(room.room.id(), harness.host.user_id, guest.user_id)
            .await
            .unwrap();

        assert_eq!(view.room.host_id(), guest.user_id);
        let stored = harness.durable_view(room.room.id()).await;
        assert_eq!(stored.current_players(), 2);
        assert_eq!(stored.member(guest.user_id).unwrap().role(), MemberRole::Host);
        assert_eq!(
            stored.member(harness.host.user_id).unwrap().role(),
            MemberRole::Player
        );
    }

    #[tokio::test]
    async fn only_host_may_transfer_to_an_active_member() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        let guest = harness.user("guest");
        harness.join(&room, &guest).await;
        let transfer = &harness.use_cases.lobby.transfer_host;
        let id = room.room.id();

        let err = transfer
            .execute(id, guest.user_id, harness.host.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Forbidden(ForbiddenReason::NotHost)));

        let err = transfer
            .execute(id, harness.host.user_id, harness.host.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::BadRequest(BadRequestReason::InvalidInput(_))));

        let err = transfer
            .execute(id, harness.host.user_id, harness.user("outsider").user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::NotFound(NotFoundReason::PlayerNotInRoom)));
    }
}
