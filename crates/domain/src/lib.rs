//! Quiz Lobby Domain
//!
//! Pure domain model for the room lobby: rooms, memberships, room settings,
//! and the events rooms emit. No I/O lives here.

extern crate self as quizlobby_domain;

pub mod aggregates;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use aggregates::{
    longest_tenured, validate_max_players, Membership, Room, DEFAULT_MAX_PLAYERS, MIN_PLAYERS,
};
pub use error::DomainError;
pub use events::{CloseReason, DomainEvent, LeaveReason, RoomEventPayload};

// Re-export ID types
pub use ids::{MembershipId, PackId, RoomId, UserId};

// Re-export value objects
pub use value_objects::{
    MemberRole, PasswordHash, RoomCode, RoomName, RoomPassword, RoomSettings, RoomStatus,
    SettingsPatch, Visibility, DEFAULT_CODE_CHARSET, DEFAULT_CODE_LENGTH,
};
