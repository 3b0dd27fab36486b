//! External service ports: identity, content packs, game sessions and the event broker.

use async_trait::async_trait;
use quizlobby_domain::{MemberRole, PackId, RoomId, RoomSettings, UserId};
use serde::{Deserialize, Serialize};

use super::error::{BrokerError, PeerError};

// =============================================================================
// Identity
// =============================================================================

/// Who a bearer token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: UserId,
    pub username: String,
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityPort: Send + Sync {
    /// `None` when the token is invalid or expired.
    async fn validate_token(&self, token: &str) -> Result<Option<TokenIdentity>, PeerError>;

    async fn get_user_info(&self, user_id: UserId) -> Result<Option<UserInfo>, PeerError>;
}

// =============================================================================
// Content packs
// =============================================================================

/// Pack status string the pack service uses for moderated, playable packs.
pub const PACK_STATUS_APPROVED: &str = "approved";

/// Result of asking the pack service whether a pack may be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackValidation {
    pub exists: bool,
    pub is_owner: bool,
    pub status: String,
    pub error: Option<String>,
}

impl PackValidation {
    pub fn is_approved(&self) -> bool {
        self.status == PACK_STATUS_APPROVED
    }

    /// A pack is usable when it exists and is approved or owned by the user.
    pub fn is_usable(&self) -> bool {
        self.exists && (self.is_approved() || self.is_owner)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackInfo {
    pub id: PackId,
    pub name: String,
    pub author: String,
    pub rounds_count: u32,
    pub questions_count: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackPort: Send + Sync {
    async fn validate_pack(
        &self,
        pack_id: PackId,
        user_id: Option<UserId>,
    ) -> Result<PackValidation, PeerError>;

    async fn get_pack_info(&self, pack_id: PackId) -> Result<Option<PackInfo>, PeerError>;
}

// =============================================================================
// Game sessions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub user_id: UserId,
    pub username: String,
    pub role: MemberRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSessionRequest {
    pub room_id: RoomId,
    pub pack_id: PackId,
    pub players: Vec<RosterEntry>,
    pub settings: RoomSettings,
    /// Repeated calls with the same key must not create a second session.
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub game_session_id: String,
    pub websocket_url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameSessionPort: Send + Sync {
    async fn create_game_session(
        &self,
        request: GameSessionRequest,
    ) -> Result<GameSession, PeerError>;
}

// =============================================================================
// Event broker
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BrokerPort: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: String) -> Result<(), BrokerError>;
}
