//! Host edits of a waiting room: game settings plus room-level fields.

use std::sync::Arc;

use quizlobby_domain::{RoomEventPayload, RoomId, RoomPassword, UserId};

use super::context::{require_host, require_waiting, LobbyContext};
use super::error::LobbyError;
use super::types::{PasswordChange, RoomView, UpdateSettingsInput};
use crate::infrastructure::password::hash_password_blocking;

pub struct UpdateSettings {
    ctx: Arc<LobbyContext>,
}

impl UpdateSettings {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    pub async fn execute(
        &self,
        room_id: RoomId,
        user_id: UserId,
        input: UpdateSettingsInput,
    ) -> Result<RoomView, LobbyError> {
        // Hash before taking the token so argon2 never runs under it.
        let new_hash = match &input.password {
            PasswordChange::Set(password) if !password.is_empty() => {
                let password = RoomPassword::new(password.as_str())?;
                Some(
                    hash_password_blocking(password)
                        .await
                        .map_err(|e| LobbyError::Internal(e.to_string()))?,
                )
            }
            _ => None,
        };

        let _guard = self.ctx.lock(room_id).await?;

        let mut room = self.ctx.load_room(room_id).await?;
        require_host(&room, user_id)?;
        require_waiting(&room)?;

        if input.is_empty() {
            return self.ctx.view(room).await;
        }

        let current = self.ctx.view(room.clone()).await?;
        let settings = current.settings.merge(&input.settings)?;
        let now = self.ctx.now();

        if let Some(max_players) = input.max_players {
            room.set_max_players(
                max_players,
                self.ctx.policy.max_players_limit,
                current.current_players(),
                now,
            )?;
        }
        if let Some(visibility) = input.visibility {
            room.set_visibility(visibility, now);
        }
        match input.password {
            PasswordChange::Keep => {}
            PasswordChange::Clear => room.set_password_hash(None, now),
            PasswordChange::Set(_) => room.set_password_hash(new_hash, now),
        }

        if settings != current.settings || room != current.room {
            self.ctx.rooms.save_with_settings(&room, &settings).await?;
        }

        tracing::info!(
            room_id = %room_id,
            max_players = room.max_players(),
            is_public = room.is_public(),
            has_password = room.has_password(),
            "Room settings updated"
        );

        let view = RoomView {
            room,
            members: current.members,
            settings,
        };
        self.ctx.reindex(&view, &[]);
        self.ctx.emit(
            room_id,
            RoomEventPayload::SettingsUpdated {
                settings: view.settings,
            },
        );
        Ok(view)
    }
}
