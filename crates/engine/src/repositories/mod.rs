//! Repository modules - data access wrappers around port traits.
//!
//! Rooms and settings are read cache-aside; memberships always hit the
//! durable store. `RoomIndex` maintains the advisory listing and pointer
//! indices in the cache.

mod cache_aside;
pub mod cache_keys;
pub mod membership;
pub mod room;
pub mod room_index;
pub mod settings;

pub use cache_aside::CacheAside;
pub use membership::MembershipRepository;
pub use room::RoomRepository;
pub use room_index::RoomIndex;
pub use settings::SettingsRepository;
