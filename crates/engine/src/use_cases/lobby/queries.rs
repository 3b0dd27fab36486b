//! Read-only lobby queries.
//!
//! Queries take no room token. They read through the cache-aside repositories
//! and the advisory indices, so a result may lag a concurrent mutation.

use std::sync::Arc;

use quizlobby_domain::{Room, RoomCode, RoomId, UserId};

use super::context::LobbyContext;
use super::error::{LobbyError, NotFoundReason};
use super::types::{RoomPage, RoomView};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct LobbyQueries {
    ctx: Arc<LobbyContext>,
}

impl LobbyQueries {
    pub fn new(ctx: Arc<LobbyContext>) -> Self {
        Self { ctx }
    }

    pub async fn get_room(&self, room_id: RoomId) -> Result<RoomView, LobbyError> {
        let room = self
            .ctx
            .rooms
            .get(room_id)
            .await?
            .ok_or(LobbyError::NotFound(NotFoundReason::Room))?;
        self.assemble(room).await
    }

    /// Non-terminal room holding `code`.
    pub async fn get_room_by_code(&self, code: &str) -> Result<RoomView, LobbyError> {
        let not_found = || LobbyError::NotFound(NotFoundReason::RoomCode(code.to_string()));
        let parsed = RoomCode::new(code).map_err(|_| not_found())?;
        let room = self
            .ctx
            .rooms
            .find_open_by_code(&parsed)
            .await?
            .ok_or_else(not_found)?;
        self.assemble(room).await
    }

    /// Public waiting rooms, newest first. `page` is zero-based.
    ///
    /// The total always comes from the durable store. The index only supplies
    /// the page ids when it agrees with that total and every id still names a
    /// listed room. Player counts are durable.
    pub async fn list_rooms(&self, page: u32, size: u32) -> Result<RoomPage, LobbyError> {
        let size = size.clamp(1, MAX_PAGE_SIZE);
        let offset = page.saturating_mul(size);
        let total = self.ctx.rooms.count_public_waiting().await?;

        let rooms = match self.indexed_rooms(total, size, offset).await? {
            Some(rooms) => rooms,
            None => {
                tracing::debug!(total, "Room listing served from durable store");
                self.ctx.rooms.list_public_waiting(size, offset).await?
            }
        };

        let mut listed = Vec::with_capacity(rooms.len());
        for room in rooms {
            let count = self.ctx.members.count_active(room.id()).await?;
            listed.push((room, count));
        }
        Ok(RoomPage {
            rooms: listed,
            total,
            page,
            size,
        })
    }

    /// Rooms for the page named by the listing index, or `None` when the
    /// index disagrees with the durable `total` or holds a stale entry.
    async fn indexed_rooms(
        &self,
        total: u64,
        size: u32,
        offset: u32,
    ) -> Result<Option<Vec<Room>>, LobbyError> {
        let Some((ids, indexed_total)) = self
            .ctx
            .index
            .listing_page(offset as usize, size as usize)
            .await
        else {
            return Ok(None);
        };
        if indexed_total != total {
            tracing::debug!(indexed_total, total, "Listing index out of step");
            return Ok(None);
        }

        let mut rooms = Vec::with_capacity(ids.len());
        for room_id in ids {
            match self.ctx.rooms.get(room_id).await? {
                Some(room) if room.is_public() && room.is_waiting() => rooms.push(room),
                _ => {
                    tracing::debug!(room_id = %room_id, "Stale listing index entry");
                    return Ok(None);
                }
            }
        }
        Ok(Some(rooms))
    }

    /// The room `user_id` is currently active in, if any.
    pub async fn get_user_current_room(
        &self,
        user_id: UserId,
    ) -> Result<Option<RoomView>, LobbyError> {
        if let Some(room_id) = self.ctx.index.current_room(user_id).await {
            if self.ctx.members.get_active(room_id, user_id).await?.is_some() {
                return self.get_room(room_id).await.map(Some);
            }
            tracing::debug!(user_id = %user_id, room_id = %room_id, "Stale current-room pointer");
        }

        match self.ctx.members.find_active_by_user(user_id).await? {
            Some(member) => {
                self.ctx.index.repair_pointer(user_id, Some(member.room_id()));
                self.get_room(member.room_id()).await.map(Some)
            }
            None => {
                self.ctx.index.repair_pointer(user_id, None);
                Ok(None)
            }
        }
    }

    async fn assemble(&self, room: Room) -> Result<RoomView, LobbyError> {
        let members = self.ctx.members.list_active(room.id()).await?;
        let settings = self.ctx.settings.get(room.id()).await?.ok_or_else(|| {
            tracing::error!(room_id = %room.id(), "Room has no settings row");
            LobbyError::Internal(format!("settings missing for room {}", room.id()))
        })?;
        Ok(RoomView {
            room,
            members,
            settings,
        })
    }
}
