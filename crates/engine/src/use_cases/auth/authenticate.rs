//! Bearer token to lobby caller.

use std::sync::Arc;

use crate::infrastructure::ports::IdentityPort;
use crate::use_cases::lobby::{ForbiddenReason, LobbyError, LobbyUser, NotFoundReason};

pub struct Authenticate {
    identity: Arc<dyn IdentityPort>,
}

impl Authenticate {
    pub fn new(identity: Arc<dyn IdentityPort>) -> Self {
        Self { identity }
    }

    pub async fn execute(&self, token: &str) -> Result<LobbyUser, LobbyError> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        if token.is_empty() {
            return Err(LobbyError::Forbidden(ForbiddenReason::InvalidToken));
        }

        let identity = self
            .identity
            .validate_token(token)
            .await
            .map_err(|e| LobbyError::upstream("identity", e))?
            .ok_or(LobbyError::Forbidden(ForbiddenReason::InvalidToken))?;

        let info = self
            .identity
            .get_user_info(identity.user_id)
            .await
            .map_err(|e| LobbyError::upstream("identity", e))?
            .ok_or(LobbyError::NotFound(NotFoundReason::User))?;

        tracing::debug!(user_id = %identity.user_id, "Caller authenticated");
        Ok(LobbyUser::new(identity.user_id, info.username).with_avatar_url(info.avatar_url))
    }
}
