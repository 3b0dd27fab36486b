//! Room aggregate - a lobby that players gather in before a quiz game
//!
//! Rooms are never deleted. They end in one of the terminal states
//! (`Finished`, `Cancelled`) and keep their history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{PasswordHash, RoomCode, RoomName, RoomStatus, Visibility};
use crate::{PackId, RoomId, UserId};

/// Smallest roster a game can start with.
pub const MIN_PLAYERS: u32 = 2;

/// Default roster size for new rooms.
pub const DEFAULT_MAX_PLAYERS: u32 = 6;

/// A quiz lobby.
///
/// # Invariants
///
/// - `max_players` is at least [`MIN_PLAYERS`]
/// - `status` only changes along the edges of [`RoomStatus::can_transition_to`]
/// - `started_at` is set exactly while the room is playing or finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    // Identity
    id: RoomId,
    code: RoomCode,

    // Ownership
    host_id: UserId,
    pack_id: PackId,

    // Core attributes
    name: RoomName,
    status: RoomStatus,
    max_players: u32,
    visibility: Visibility,
    password_hash: Option<PasswordHash>,

    // Timestamps
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Room {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Create a new waiting room.
    ///
    /// `max_players` must be within `MIN_PLAYERS..=max_players_limit`.
    pub fn new(
        id: RoomId,
        code: RoomCode,
        host_id: UserId,
        pack_id: PackId,
        name: RoomName,
        max_players: u32,
        max_players_limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        validate_max_players(max_players, max_players_limit)?;
        Ok(Self {
            id,
            code,
            host_id,
            pack_id,
            name,
            status: RoomStatus::Waiting,
            max_players,
            visibility: Visibility::Public,
            password_hash: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        })
    }

    // =========================================================================
    // Identity Accessors (read-only)
    // =========================================================================

    #[inline]
    pub fn id(&self) -> RoomId {
        self.id
    }

    #[inline]
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    #[inline]
    pub fn host_id(&self) -> UserId {
        self.host_id
    }

    #[inline]
    pub fn pack_id(&self) -> PackId {
        self.pack_id
    }

    // =========================================================================
    // Attribute Accessors
    // =========================================================================

    #[inline]
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    #[inline]
    pub fn status(&self) -> RoomStatus {
        self.status
    }

    #[inline]
    pub fn max_players(&self) -> u32 {
        self.max_players
    }

    #[inline]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.visibility.is_public()
    }

    #[inline]
    pub fn password_hash(&self) -> Option<&PasswordHash> {
        self.password_hash.as_ref()
    }

    #[inline]
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    // =========================================================================
    // Timestamp Accessors
    // =========================================================================

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[inline]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[inline]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn is_host(&self, user_id: UserId) -> bool {
        self.host_id == user_id
    }

    pub fn is_waiting(&self) -> bool {
        self.status == RoomStatus::Waiting
    }

    pub fn is_full(&self, active_players: u32) -> bool {
        active_players >= self.max_players
    }

    // =========================================================================
    // Builder Methods (for construction)
    // =========================================================================

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_password_hash(mut self, password_hash: Option<PasswordHash>) -> Self {
        self.password_hash = password_hash;
        self
    }

    /// Set the status (used when loading from storage).
    pub fn with_status(mut self, status: RoomStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the timestamps (used when loading from storage).
    pub fn with_timestamps(
        mut self,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        started_at: Option<DateTime<Utc>>,
        finished_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self.started_at = started_at;
        self.finished_at = finished_at;
        self
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// WAITING -> STARTING, while the game service is being asked for a session.
    pub fn begin_start(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(RoomStatus::Starting, now)
    }

    /// STARTING -> PLAYING once the game session exists.
    pub fn mark_playing(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(RoomStatus::Playing, now)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// STARTING -> WAITING after a failed start.
    pub fn revert_start(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(RoomStatus::Waiting, now)?;
        self.started_at = None;
        Ok(())
    }

    /// PLAYING -> FINISHED when the game session ends.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(RoomStatus::Finished, now)?;
        self.finished_at = Some(now);
        Ok(())
    }

    /// WAITING -> CANCELLED, by the host or because everyone left.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(RoomStatus::Cancelled, now)?;
        self.finished_at = Some(now);
        Ok(())
    }

    fn transition(&mut self, next: RoomStatus, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_transition(self.status, next));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn change_host(&mut self, new_host: UserId, now: DateTime<Utc>) {
        self.host_id = new_host;
        self.updated_at = now;
    }

    /// Change the roster limit. It cannot drop below the players already seated.
    pub fn set_max_players(
        &mut self,
        max_players: u32,
        max_players_limit: u32,
        active_players: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        validate_max_players(max_players, max_players_limit)?;
        if max_players < active_players {
            return Err(DomainError::validation(format!(
                "maxPlayers cannot be lower than the {} players already in the room",
                active_players
            )));
        }
        self.max_players = max_players;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_visibility(&mut self, visibility: Visibility, now: DateTime<Utc>) {
        self.visibility = visibility;
        self.updated_at = now;
    }

    pub fn set_password_hash(&mut self, password_hash: Option<PasswordHash>, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.updated_at = now;
    }
}

/// Check a requested roster size against the configured limit.
pub fn validate_max_players(max_players: u32, max_players_limit: u32) -> Result<(), DomainError> {
    if max_players < MIN_PLAYERS || max_players > max_players_limit {
        return Err(DomainError::validation(format!(
            "maxPlayers must be between {} and {}",
            MIN_PLAYERS, max_players_limit
        )));
    }
    Ok(())
}
