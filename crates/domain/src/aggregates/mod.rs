//! Aggregate roots - domain objects that own their related data
//!
//! Each aggregate:
//! - Has a unique identity
//! - Exposes behavior through methods, not public fields
//! - Rejects illegal mutations with a `DomainError`

pub mod membership;
pub mod room;

pub use membership::{longest_tenured, Membership};
pub use room::{validate_max_players, Room, DEFAULT_MAX_PLAYERS, MIN_PLAYERS};
