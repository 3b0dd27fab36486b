//! Quiz Lobby Engine library.
//!
//! Server-side orchestration of quiz lobbies: rooms, memberships and
//! settings from creation to game start.
//!
//! ## Structure
//!
//! - `repositories/` - Cache-aside wrappers and the advisory room index
//! - `use_cases/` - Lobby lifecycle and caller authentication
//! - `infrastructure/` - Port traits and their adapters (SQLite, cache, peers, broker)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod repositories;
pub mod use_cases;

/// Test fixtures shared by the use case tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
