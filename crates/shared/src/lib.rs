//! Quiz Lobby Shared - Wire contracts
//!
//! Types exchanged with things outside the engine:
//! - Room projections returned to lobby clients
//! - The live room event stream
//! - Records published to the `game.events` broker topic
//! - Response envelope and error codes
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - serde, uuid, chrono and the domain crate
//! 2. **No business logic** - Pure data types and serialization
//! 3. **No domain IDs in DTOs** - use raw `uuid::Uuid`

pub mod broker;
pub mod dto;
pub mod responses;

pub use broker::{BrokerEventType, BrokerRecord, GAME_EVENTS_TOPIC};
pub use dto::{PlayerDto, RoomDto, RoomListDto, RoomSettingsDto, RoomSummaryDto};
pub use responses::{ErrorCode, ResponseResult};

// =============================================================================
// Live Event Stream
// =============================================================================
// Subscribers receive domain events verbatim as `{type, roomId, timestamp, payload}`.
pub use quizlobby_domain::events::{CloseReason, DomainEvent, LeaveReason, RoomEventPayload};
