//! Cache key layout.

use quizlobby_domain::{RoomId, UserId};

/// Sorted set of public WAITING rooms scored by creation time (ms).
pub const ACTIVE_ROOMS: &str = "active_rooms";

pub fn room_meta(room_id: RoomId) -> String {
    format!("room:{room_id}:meta")
}

pub fn room_settings(room_id: RoomId) -> String {
    format!("room:{room_id}:settings")
}

/// Set of active member user ids.
pub fn room_players(room_id: RoomId) -> String {
    format!("room:{room_id}:players")
}

pub fn user_current_room(user_id: UserId) -> String {
    format!("user:{user_id}:current_room")
}
