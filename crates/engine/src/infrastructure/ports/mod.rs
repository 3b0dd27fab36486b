//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Durable storage (could swap SQLite -> Postgres)
//! - Cache storage (could swap in-process -> Redis)
//! - Peer services (identity, packs, game sessions)
//! - The event broker
//! - Clock/Random (for testing)

mod cache;
mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{MembershipRepo, RoomRepo, SettingsRepo};

// =============================================================================
// Cache Port
// =============================================================================
pub use cache::CacheStore;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    BrokerPort, GameSession, GameSessionPort, GameSessionRequest, IdentityPort, PackInfo,
    PackPort, PackValidation, RosterEntry, TokenIdentity, UserInfo, PACK_STATUS_APPROVED,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockMembershipRepo, MockRoomRepo, MockSettingsRepo};

#[cfg(test)]
pub use cache::MockCacheStore;

#[cfg(test)]
pub use external::{MockBrokerPort, MockGameSessionPort, MockIdentityPort, MockPackPort};

#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{BrokerError, CacheError, PeerError, RepoError};
