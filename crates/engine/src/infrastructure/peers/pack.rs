//! Pack service client.

use std::time::Duration;

use async_trait::async_trait;
use quizlobby_domain::{PackId, UserId};
use reqwest::Client;
use serde::Deserialize;

use super::{http_client, normalize_base_url, read_json, read_optional_json, transport_error};
use crate::infrastructure::ports::{PackInfo, PackPort, PackValidation, PeerError};

#[derive(Clone)]
pub struct HttpPackClient {
    client: Client,
    base_url: String,
}

impl HttpPackClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: normalize_base_url(base_url),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidatePackResponse {
    exists: bool,
    #[serde(default)]
    is_owner: bool,
    #[serde(default)]
    status: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackInfoResponse {
    id: PackId,
    name: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    rounds_count: u32,
    #[serde(default)]
    questions_count: u32,
}

#[async_trait]
impl PackPort for HttpPackClient {
    async fn validate_pack(
        &self,
        pack_id: PackId,
        user_id: Option<UserId>,
    ) -> Result<PackValidation, PeerError> {
        let mut request = self
            .client
            .get(format!("{}/api/packs/{}/validate", self.base_url, pack_id));
        if let Some(user_id) = user_id {
            request = request.query(&[("userId", user_id.to_string())]);
        }

        let response = request.send().await.map_err(transport_error)?;

        // The pack service answers 404 for unknown packs; that is a validation result.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(PackValidation {
                exists: false,
                is_owner: false,
                status: String::new(),
                error: Some(format!("pack {pack_id} not found")),
            });
        }

        let body: ValidatePackResponse = read_json(response).await?;
        Ok(PackValidation {
            exists: body.exists,
            is_owner: body.is_owner,
            status: body.status,
            error: body.error,
        })
    }

    async fn get_pack_info(&self, pack_id: PackId) -> Result<Option<PackInfo>, PeerError> {
        let response = self
            .client
            .get(format!("{}/api/packs/{}", self.base_url, pack_id))
            .send()
            .await
            .map_err(transport_error)?;

        let body: Option<PackInfoResponse> = read_optional_json(response).await?;
        Ok(body.map(|pack| PackInfo {
            id: pack.id,
            name: pack.name,
            author: pack.author,
            rounds_count: pack.rounds_count,
            questions_count: pack.questions_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_defaults_missing_fields() {
        let body: ValidatePackResponse = serde_json::from_str(r#"{"exists":true}"#).unwrap();
        assert!(body.exists);
        assert!(!body.is_owner);
        assert!(body.status.is_empty());
    }
}
