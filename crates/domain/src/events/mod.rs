//! Domain Events
//!
//! Room-scoped events fanned out to connected clients. Each event serializes as
//! `{type, roomId, timestamp, payload}`; the broker projection lives in the
//! engine and only carries a subset of these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::RoomSettings;
use crate::{RoomId, UserId};

/// An event that happened in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub room_id: RoomId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: RoomEventPayload,
}

impl DomainEvent {
    pub fn new(room_id: RoomId, timestamp: DateTime<Utc>, payload: RoomEventPayload) -> Self {
        Self {
            room_id,
            timestamp,
            payload,
        }
    }

    /// Wire name of the event type.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

/// Type-specific part of a [`DomainEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum RoomEventPayload {
    PlayerJoined {
        user_id: UserId,
        username: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avatar_url: Option<String>,
        current_players: u32,
    },
    PlayerLeft {
        user_id: UserId,
        username: String,
        reason: LeaveReason,
        current_players: u32,
    },
    PlayerReady {
        user_id: UserId,
        is_ready: bool,
        all_players_ready: bool,
        ready_count: u32,
        total_count: u32,
    },
    SettingsUpdated {
        settings: RoomSettings,
    },
    RoomStarted {
        game_session_id: String,
        websocket_url: String,
    },
    RoomClosed {
        reason: CloseReason,
    },
}

impl RoomEventPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::PlayerReady { .. } => "player_ready",
            Self::SettingsUpdated { .. } => "settings_updated",
            Self::RoomStarted { .. } => "room_started",
            Self::RoomClosed { .. } => "room_closed",
        }
    }
}

/// Why a membership ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveReason {
    Left,
    Kicked,
}

impl LeaveReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Kicked => "kicked",
        }
    }
}

/// Why a room's live channel was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Last member left.
    NoPlayers,
    /// Host cancelled the room.
    Cancelled,
    /// The game session ended.
    Finished,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPlayers => "no_players",
            Self::Cancelled => "cancelled",
            Self::Finished => "finished",
        }
    }
}
