//! Infrastructure implementations.
//!
//! Port traits plus the adapters behind them, and the in-process machinery
//! (locks, live channels, background pool, counters) the use cases share.

pub mod background;
pub mod broker;
pub mod cache;
pub mod clock;
pub mod config;
pub mod metrics;
pub mod password;
pub mod peers;
pub mod ports;
pub mod resilient;
pub mod room_events;
pub mod room_locks;
pub mod sqlite;
