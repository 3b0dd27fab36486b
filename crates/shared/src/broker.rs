//! Records published to the `game.events` broker topic.
//!
//! Consumers key on `type`; `data` is a flat string map so consumers in any
//! language can read it without a schema.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic lobby events are published to.
pub const GAME_EVENTS_TOPIC: &str = "game.events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BrokerEventType {
    RoomCreated,
    PlayerJoined,
    PlayerLeft,
    RoomStarted,
    RoomFinished,
    RoomCancelled,
}

impl BrokerEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoomCreated => "ROOM_CREATED",
            Self::PlayerJoined => "PLAYER_JOINED",
            Self::PlayerLeft => "PLAYER_LEFT",
            Self::RoomStarted => "ROOM_STARTED",
            Self::RoomFinished => "ROOM_FINISHED",
            Self::RoomCancelled => "ROOM_CANCELLED",
        }
    }
}

impl fmt::Display for BrokerEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of one broker message. The message key is the room id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerRecord {
    #[serde(rename = "type")]
    pub event_type: BrokerEventType,
    pub room_id: Uuid,
    pub data: BTreeMap<String, String>,
}

impl BrokerRecord {
    pub fn new(event_type: BrokerEventType, room_id: Uuid) -> Self {
        Self {
            event_type,
            room_id,
            data: BTreeMap::new(),
        }
    }

    /// Add one data field.
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.data.insert(key.to_string(), value.to_string());
        self
    }

    /// Broker message key.
    pub fn key(&self) -> String {
        self.room_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_type_room_and_string_map() {
        let room_id = Uuid::new_v4();
        let record = BrokerRecord::new(BrokerEventType::RoomCancelled, room_id)
            .with("reason", "manual")
            .with("current_players", 0);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "ROOM_CANCELLED");
        assert_eq!(json["roomId"], room_id.to_string());
        assert_eq!(json["data"]["reason"], "manual");
        assert_eq!(json["data"]["current_players"], "0");
        assert_eq!(record.key(), room_id.to_string());
    }
}
