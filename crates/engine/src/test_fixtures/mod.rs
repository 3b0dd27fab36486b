//! Shared test fixtures.
//!
//! `lobby::LobbyHarness` assembles the real application over a temporary
//! SQLite database, the in-process cache and scripted peer services.

pub mod lobby;
