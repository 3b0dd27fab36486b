//! Room projections sent to lobby clients.
//!
//! Raw `uuid::Uuid` is used instead of domain ID newtypes so clients do not
//! depend on domain invariants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A room as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: Uuid,
    pub room_code: String,
    pub name: String,
    pub host_id: Uuid,
    pub pack_id: Uuid,
    pub status: String,
    pub max_players: u32,
    pub current_players: u32,
    pub is_public: bool,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub players: Vec<PlayerDto>,
    pub settings: RoomSettingsDto,
}

/// An active member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub user_id: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: String,
    pub is_ready: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettingsDto {
    pub time_for_answer: u32,
    pub time_for_choice: u32,
    pub allow_wrong_answer: bool,
    pub show_right_answer: bool,
}

/// One page of public rooms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListDto {
    pub rooms: Vec<RoomSummaryDto>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

/// Listing entry: the room without its roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: Uuid,
    pub room_code: String,
    pub name: String,
    pub host_id: Uuid,
    pub pack_id: Uuid,
    pub status: String,
    pub max_players: u32,
    pub current_players: u32,
    pub is_public: bool,
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}
