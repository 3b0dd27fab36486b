//! Lobby counters.
//!
//! Monotonic atomics for lifecycle events plus a per-peer outcome table.
//! `snapshot()` gives a consistent-enough copy for logging or an admin endpoint.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Final outcome of one resilient peer call (after retries).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeerOutcome {
    Success,
    RetryExhausted,
    NonRetryable,
}

impl PeerOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::RetryExhausted => "retry_exhausted",
            Self::NonRetryable => "non_retryable",
        }
    }
}

impl fmt::Display for PeerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
pub struct LobbyMetrics {
    rooms_created: AtomicU64,
    rooms_started: AtomicU64,
    rooms_cancelled: AtomicU64,
    rooms_finished: AtomicU64,
    start_failures: AtomicU64,
    starts_recovered: AtomicU64,
    players_joined: AtomicU64,
    players_left: AtomicU64,
    cache_errors: AtomicU64,
    background_dropped: AtomicU64,
    broker_published: AtomicU64,
    broker_failed: AtomicU64,
    peer_retries: DashMap<&'static str, u64>,
    peer_calls: DashMap<(&'static str, PeerOutcome), u64>,
}

impl LobbyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room_created(&self) {
        self.rooms_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn room_started(&self) {
        self.rooms_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn room_cancelled(&self) {
        self.rooms_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn room_finished(&self) {
        self.rooms_finished.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_failed(&self) {
        self.start_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A room found stuck in STARTING was put back to WAITING.
    pub fn start_recovered(&self) {
        self.starts_recovered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn player_joined(&self) {
        self.players_joined.fetch_add(1, Ordering::Relaxed);
    }

    pub fn player_left(&self) {
        self.players_left.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn background_dropped(&self) {
        self.background_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn broker_published(&self) {
        self.broker_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn broker_failed(&self) {
        self.broker_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn peer_retry(&self, peer: &'static str) {
        *self.peer_retries.entry(peer).or_insert(0) += 1;
    }

    pub fn peer_call(&self, peer: &'static str, outcome: PeerOutcome) {
        *self.peer_calls.entry((peer, outcome)).or_insert(0) += 1;
    }

    /// Count of final outcomes recorded for one peer.
    pub fn peer_calls(&self, peer: &'static str, outcome: PeerOutcome) -> u64 {
        self.peer_calls
            .get(&(peer, outcome))
            .map(|count| *count)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rooms_created: self.rooms_created.load(Ordering::Relaxed),
            rooms_started: self.rooms_started.load(Ordering::Relaxed),
            rooms_cancelled: self.rooms_cancelled.load(Ordering::Relaxed),
            rooms_finished: self.rooms_finished.load(Ordering::Relaxed),
            start_failures: self.start_failures.load(Ordering::Relaxed),
            starts_recovered: self.starts_recovered.load(Ordering::Relaxed),
            players_joined: self.players_joined.load(Ordering::Relaxed),
            players_left: self.players_left.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            background_dropped: self.background_dropped.load(Ordering::Relaxed),
            broker_published: self.broker_published.load(Ordering::Relaxed),
            broker_failed: self.broker_failed.load(Ordering::Relaxed),
            peer_retries: self
                .peer_retries
                .iter()
                .map(|entry| (entry.key().to_string(), *entry.value()))
                .collect(),
            peer_calls: self
                .peer_calls
                .iter()
                .map(|entry| {
                    let (peer, outcome) = entry.key();
                    (format!("{peer}.{outcome}"), *entry.value())
                })
                .collect(),
        }
    }
}

/// Point-in-time copy of the lobby counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rooms_created: u64,
    pub rooms_started: u64,
    pub rooms_cancelled: u64,
    pub rooms_finished: u64,
    pub start_failures: u64,
    pub starts_recovered: u64,
    pub players_joined: u64,
    pub players_left: u64,
    pub cache_errors: u64,
    pub background_dropped: u64,
    pub broker_published: u64,
    pub broker_failed: u64,
    /// Retries per peer.
    pub peer_retries: BTreeMap<String, u64>,
    /// Final outcomes keyed `peer.outcome`.
    pub peer_calls: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_outcomes_are_keyed_by_peer_and_outcome() {
        let metrics = LobbyMetrics::new();
        metrics.peer_call("game", PeerOutcome::Success);
        metrics.peer_call("game", PeerOutcome::Success);
        metrics.peer_call("game", PeerOutcome::RetryExhausted);
        metrics.peer_call("pack", PeerOutcome::NonRetryable);

        assert_eq!(metrics.peer_calls("game", PeerOutcome::Success), 2);
        assert_eq!(metrics.peer_calls("pack", PeerOutcome::Success), 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.peer_calls.get("game.retry_exhausted"), Some(&1));
        assert_eq!(snapshot.peer_calls.get("pack.non_retryable"), Some(&1));
    }

    #[test]
    fn snapshot_copies_counters() {
        let metrics = LobbyMetrics::new();
        metrics.room_created();
        metrics.player_joined();
        metrics.player_joined();
        metrics.cache_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rooms_created, 1);
        assert_eq!(snapshot.players_joined, 2);
        assert_eq!(snapshot.cache_errors, 1);
        assert_eq!(snapshot.rooms_started, 0);
    }
}
