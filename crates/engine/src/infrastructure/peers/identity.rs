//! Identity service client.

use std::time::Duration;

use async_trait::async_trait;
use quizlobby_domain::UserId;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{http_client, normalize_base_url, read_json, read_optional_json, transport_error};
use crate::infrastructure::ports::{IdentityPort, PeerError, TokenIdentity, UserInfo};

#[derive(Clone)]
pub struct HttpIdentityClient {
    client: Client,
    base_url: String,
}

impl HttpIdentityClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: normalize_base_url(base_url),
        }
    }
}

#[derive(Serialize)]
struct ValidateTokenRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateTokenResponse {
    valid: bool,
    user_id: Option<UserId>,
    username: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserInfoResponse {
    user_id: UserId,
    username: String,
    #[serde(default)]
    avatar_url: Option<String>,
}

impl ValidateTokenResponse {
    fn into_identity(self) -> Result<Option<TokenIdentity>, PeerError> {
        if !self.valid {
            return Ok(None);
        }
        match (self.user_id, self.username) {
            (Some(user_id), Some(username)) => Ok(Some(TokenIdentity { user_id, username })),
            _ => Err(PeerError::Malformed(
                "valid token response without userId or username".into(),
            )),
        }
    }
}

#[async_trait]
impl IdentityPort for HttpIdentityClient {
    async fn validate_token(&self, token: &str) -> Result<Option<TokenIdentity>, PeerError> {
        let response = self
            .client
            .post(format!("{}/api/auth/validate", self.base_url))
            .json(&ValidateTokenRequest { token })
            .send()
            .await
            .map_err(transport_error)?;

        // An unknown token is an answer, not a failure.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let body: ValidateTokenResponse = read_json(response).await?;
        body.into_identity()
    }

    async fn get_user_info(&self, user_id: UserId) -> Result<Option<UserInfo>, PeerError> {
        let response = self
            .client
            .get(format!("{}/api/users/{}", self.base_url, user_id))
            .send()
            .await
            .map_err(transport_error)?;

        let body: Option<UserInfoResponse> = read_optional_json(response).await?;
        Ok(body.map(|user| UserInfo {
            user_id: user.user_id,
            username: user.username,
            avatar_url: user.avatar_url,
        }))
    }
}
