//! Durable store ports for the three lobby aggregates.

use async_trait::async_trait;
use quizlobby_domain::{Membership, Room, RoomCode, RoomId, RoomSettings, UserId};

use super::error::RepoError;

// =============================================================================
// Rooms
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepo: Send + Sync {
    async fn get(&self, id: RoomId) -> Result<Option<Room>, RepoError>;

    /// Read straight from the durable store. Use before any mutation.
    async fn get_for_update(&self, id: RoomId) -> Result<Option<Room>, RepoError>;

    /// Non-terminal room holding `code`, if any. Always durable.
    async fn find_open_by_code(&self, code: &RoomCode) -> Result<Option<Room>, RepoError>;

    /// Persist a new room, its settings and its host membership in one transaction.
    async fn create_with_host(
        &self,
        room: &Room,
        settings: &RoomSettings,
        host: &Membership,
    ) -> Result<(), RepoError>;

    async fn save(&self, room: &Room) -> Result<(), RepoError>;

    /// Update the room row and the given membership rows in one transaction.
    async fn save_with_members(
        &self,
        room: &Room,
        members: &[Membership],
    ) -> Result<(), RepoError>;

    /// Update the room row and upsert its settings in one transaction.
    async fn save_with_settings(
        &self,
        room: &Room,
        settings: &RoomSettings,
    ) -> Result<(), RepoError>;

    /// Public waiting rooms, newest first.
    async fn list_public_waiting(&self, limit: u32, offset: u32) -> Result<Vec<Room>, RepoError>;

    async fn count_public_waiting(&self) -> Result<u64, RepoError>;
}

// =============================================================================
// Memberships
// =============================================================================

/// Membership reads here are invariant-sensitive and always hit the durable store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepo: Send + Sync {
    async fn insert(&self, membership: &Membership) -> Result<(), RepoError>;

    async fn save(&self, membership: &Membership) -> Result<(), RepoError>;

    async fn get_active(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Option<Membership>, RepoError>;

    /// The user's active membership in any room.
    async fn find_active_by_user(&self, user_id: UserId) -> Result<Option<Membership>, RepoError>;

    /// Active members ordered by `joined_at`, then membership id.
    async fn list_active(&self, room_id: RoomId) -> Result<Vec<Membership>, RepoError>;

    async fn count_active(&self, room_id: RoomId) -> Result<u32, RepoError>;
}

// =============================================================================
// Settings
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get(&self, room_id: RoomId) -> Result<Option<RoomSettings>, RepoError>;

    async fn get_for_update(&self, room_id: RoomId) -> Result<Option<RoomSettings>, RepoError>;

    async fn save(&self, room_id: RoomId, settings: &RoomSettings) -> Result<(), RepoError>;
}
