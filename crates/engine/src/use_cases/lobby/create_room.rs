//! Room creation.

use std::sync::Arc;

use quizlobby_domain::{
    validate_max_players, MemberRole, Membership, PackId, Room, RoomName, RoomPassword,
    RoomSettings,
};

use super::code_generator::RoomCodeGenerator;
use super::context::LobbyContext;
use super::error::{BadRequestReason, ConflictReason, LobbyError, NotFoundReason};
use super::types::{CreateRoomInput, LobbyUser, RoomView};
use crate::infrastructure::password::hash_password_blocking;
use crate::infrastructure::ports::PackPort;

pub struct CreateRoom {
    ctx: Arc<LobbyContext>,
    pack: Arc<dyn PackPort>,
    codes: Arc<RoomCodeGenerator>,
}

impl CreateRoom {
    pub fn new(
        ctx: Arc<LobbyContext>,
        pack: Arc<dyn PackPort>,
        codes: Arc<RoomCodeGenerator>,
    ) -> Self {
        Self { ctx, pack, codes }
    }

    pub async fn execute(
        &self,
        host: &LobbyUser,
        input: CreateRoomInput,
    ) -> Result<RoomView, LobbyError> {
        let name = RoomName::new(input.name)?;
        validate_max_players(input.max_players, self.ctx.policy.max_players_limit)?;
        let password = input
            .password
            .filter(|p| !p.is_empty())
            .map(RoomPassword::new)
            .transpose()?;
        let settings = RoomSettings::default().merge(&input.settings)?;

        if self
            .ctx
            .members
            .find_active_by_user(host.user_id)
            .await?
            .is_some()
        {
            return Err(LobbyError::Conflict(ConflictReason::AlreadyInAnotherRoom));
        }

        let validation = self
            .pack
            .validate_pack(input.pack_id, Some(host.user_id))
            .await
            .map_err(|e| LobbyError::upstream("pack", e))?;
        if !validation.exists {
            return Err(LobbyError::NotFound(NotFoundReason::Pack));
        }
        if !validation.is_usable() {
            tracing::info!(
                pack_id = %input.pack_id,
                status = %validation.status,
                "Rejected room for unapproved pack"
            );
            return Err(LobbyError::BadRequest(BadRequestReason::PackNotApproved));
        }

        let pack_name = self.pack_name(input.pack_id).await;
        let password_hash = match password {
            Some(password) => Some(
                hash_password_blocking(password)
                    .await
                    .map_err(|e| LobbyError::Internal(e.to_string()))?,
            ),
            None => None,
        };

        let code = self.codes.generate_unique_code().await?;
        let room_id = self.ctx.new_room_id();
        let _guard = self.ctx.lock(room_id).await?;

        let now = self.ctx.now();
        let room = Room::new(
            room_id,
            code,
            host.user_id,
            input.pack_id,
            name,
            input.max_players,
            self.ctx.policy.max_players_limit,
            now,
        )?
        .with_visibility(input.visibility)
        .with_password_hash(password_hash);

        let host_membership = Membership::new(
            self.ctx.new_membership_id(),
            room_id,
            host.user_id,
            host.username.clone(),
            MemberRole::Host,
            now,
        )
        .with_avatar_url(host.avatar_url.clone());

        self.ctx
            .rooms
            .create_with_host(&room, &settings, &host_membership)
            .await?;

        tracing::info!(
            room_id = %room.id(),
            code = %room.code(),
            host_id = %host.user_id,
            pack_id = %room.pack_id(),
            "Room created"
        );
        self.ctx.metrics.room_created();

        let view = RoomView {
            room,
            members: vec![host_membership],
            settings,
        };
        self.ctx.reindex(&view, &[]);
        self.ctx
            .durable
            .room_created(&view.room, &host.username, pack_name.as_deref());

        Ok(view)
    }

    /// Pack name for ROOM_CREATED. A failed lookup never blocks creation.
    async fn pack_name(&self, pack_id: PackId) -> Option<String> {
        match self.pack.get_pack_info(pack_id).await {
            Ok(info) => info.map(|info| info.name),
            Err(e) => {
                tracing::warn!(pack_id = %pack_id, error = %e, "Pack info lookup failed");
                None
            }
        }
    }
}
