//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific domain area.
//! Use cases orchestrate across the repository wrappers and peer ports.

pub mod auth;
pub mod lobby;

pub use auth::AuthUseCases;
pub use lobby::LobbyUseCases;
