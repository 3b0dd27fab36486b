//! Resilient peer client wrappers with bounded retry and per-call timeout
//!
//! Wraps any identity, pack or game-session port. Only transient failures
//! (unavailable, deadline exceeded, resource exhausted) are retried; a
//! per-attempt timeout counts as deadline exceeded.

use async_trait::async_trait;
use quizlobby_domain::{PackId, UserId};
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::metrics::{LobbyMetrics, PeerOutcome};
use crate::infrastructure::ports::{
    GameSession, GameSessionPort, GameSessionRequest, IdentityPort, PackInfo, PackPort,
    PackValidation, PeerError, TokenIdentity, UserInfo,
};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Cap on the doubled delay
    pub max_backoff: Duration,
    /// Deadline for a single attempt
    pub call_timeout: Duration,
    /// Jitter factor (0.0-1.0) applied around each delay
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(2000),
            call_timeout: Duration::from_secs(5),
            jitter_factor: 0.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): initial * 2^(retry-1), capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as u64;
        let exponential = base.saturating_mul(2u64.saturating_pow(retry.saturating_sub(1)));
        let capped = exponential.min(self.max_backoff.as_millis() as u64);

        let jitter_range = (capped as f64 * self.jitter_factor) as i64;
        let millis = if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        };
        Duration::from_millis(millis)
    }
}

/// Runs peer calls under a [`RetryPolicy`] and records outcomes.
#[derive(Clone)]
pub struct PeerCaller {
    peer: &'static str,
    policy: RetryPolicy,
    metrics: Arc<LobbyMetrics>,
}

impl PeerCaller {
    pub fn new(peer: &'static str, policy: RetryPolicy, metrics: Arc<LobbyMetrics>) -> Self {
        Self {
            peer,
            policy,
            metrics,
        }
    }

    pub fn peer(&self) -> &'static str {
        self.peer
    }

    pub async fn call<T, F, Fut>(&self, operation: &'static str, op: F) -> Result<T, PeerError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, PeerError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let error = match tokio::time::timeout(self.policy.call_timeout, op()).await {
                Ok(Ok(value)) => {
                    if attempt > 1 {
                        tracing::info!(
                            peer = self.peer,
                            operation,
                            attempt,
                            "Peer call succeeded after retry"
                        );
                    }
                    self.metrics.peer_call(self.peer, PeerOutcome::Success);
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) => PeerError::DeadlineExceeded(format!(
                    "{} {} timed out after {:?}",
                    self.peer, operation, self.policy.call_timeout
                )),
            };

            if !error.is_retryable() {
                tracing::warn!(
                    peer = self.peer,
                    operation,
                    error = %error,
                    "Peer call failed with non-retryable error"
                );
                self.metrics.peer_call(self.peer, PeerOutcome::NonRetryable);
                return Err(error);
            }

            if attempt == max_attempts {
                tracing::error!(
                    peer = self.peer,
                    operation,
                    attempts = max_attempts,
                    error = %error,
                    "Peer call failed after all retry attempts"
                );
                self.metrics.peer_call(self.peer, PeerOutcome::RetryExhausted);
                return Err(error);
            }

            let delay = self.policy.backoff(attempt);
            tracing::warn!(
                peer = self.peer,
                operation,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Peer call failed, retrying"
            );
            self.metrics.peer_retry(self.peer);
            tokio::time::sleep(delay).await;
        }

        // max_attempts >= 1, so the loop always returns.
        Err(PeerError::Unavailable(format!(
            "{} {} was never attempted",
            self.peer, operation
        )))
    }
}

// =============================================================================
// Wrapped ports
// =============================================================================

/// Identity client with retry
pub struct ResilientIdentityClient {
    inner: Arc<dyn IdentityPort>,
    caller: PeerCaller,
}

impl ResilientIdentityClient {
    pub fn new(inner: Arc<dyn IdentityPort>, policy: RetryPolicy, metrics: Arc<LobbyMetrics>) -> Self {
        Self {
            inner,
            caller: PeerCaller::new("identity", policy, metrics),
        }
    }
}

#[async_trait]
impl IdentityPort for ResilientIdentityClient {
    async fn validate_token(&self, token: &str) -> Result<Option<TokenIdentity>, PeerError> {
        let inner = Arc::clone(&self.inner);
        self.caller
            .call("validate_token", || {
                let inner = Arc::clone(&inner);
                let token = token.to_string();
                async move { inner.validate_token(&token).await }
            })
            .await
    }

    async fn get_user_info(&self, user_id: UserId) -> Result<Option<UserInfo>, PeerError> {
        let inner = Arc::clone(&self.inner);
        self.caller
            .call("get_user_info", || {
                let inner = Arc::clone(&inner);
                async move { inner.get_user_info(user_id).await }
            })
            .await
    }
}

/// Pack client with retry
pub struct ResilientPackClient {
    inner: Arc<dyn PackPort>,
    caller: PeerCaller,
}

impl ResilientPackClient {
    pub fn new(inner: Arc<dyn PackPort>, policy: RetryPolicy, metrics: Arc<LobbyMetrics>) -> Self {
        Self {
            inner,
            caller: PeerCaller::new("pack", policy, metrics),
        }
    }
}

#[async_trait]
impl PackPort for ResilientPackClient {
    async fn validate_pack(
        &self,
        pack_id: PackId,
        user_id: Option<UserId>,
    ) -> Result<PackValidation, PeerError> {
        let inner = Arc::clone(&self.inner);
        self.caller
            .call("validate_pack", || {
                let inner = Arc::clone(&inner);
                async move { inner.validate_pack(pack_id, user_id).await }
            })
            .await
    }

    async fn get_pack_info(&self, pack_id: PackId) -> Result<Option<PackInfo>, PeerError> {
        let inner = Arc::clone(&self.inner);
        self.caller
            .call("get_pack_info", || {
                let inner = Arc::clone(&inner);
                async move { inner.get_pack_info(pack_id).await }
            })
            .await
    }
}

/// Game-session client with retry. Safe to retry because every request
/// carries an idempotency key.
pub struct ResilientGameClient {
    inner: Arc<dyn GameSessionPort>,
    caller: PeerCaller,
}

impl ResilientGameClient {
    pub fn new(
        inner: Arc<dyn GameSessionPort>,
        policy: RetryPolicy,
        metrics: Arc<LobbyMetrics>,
    ) -> Self {
        Self {
            inner,
            caller: PeerCaller::new("game", policy, metrics),
        }
    }
}

#[async_trait]
impl GameSessionPort for ResilientGameClient {
    async fn create_game_session(
        &self,
        request: GameSessionRequest,
    ) -> Result<GameSession, PeerError> {
        let inner = Arc::clone(&self.inner);
        self.caller
            .call("create_game_session", || {
                let inner = Arc::clone(&inner);
                let request = request.clone();
                async move { inner.create_game_session(request).await }
            })
            .await
    }
}
