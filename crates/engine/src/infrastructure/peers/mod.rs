//! HTTP/JSON clients for the identity, pack and game-session services.
//!
//! Each client maps transport failures and HTTP statuses onto [`PeerError`]
//! so the resilient wrappers can decide what to retry.

mod game;
mod identity;
mod pack;

pub use game::HttpGameClient;
pub use identity::HttpIdentityClient;
pub use pack::HttpPackClient;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::infrastructure::ports::PeerError;

/// Build a pooled client. The resilient layer applies the per-call deadline,
/// this is only a backstop.
pub(crate) fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| Client::new())
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Classify a transport-level failure.
pub(crate) fn transport_error(error: reqwest::Error) -> PeerError {
    if error.is_timeout() {
        PeerError::DeadlineExceeded(error.to_string())
    } else if error.is_decode() {
        PeerError::Malformed(error.to_string())
    } else {
        PeerError::Unavailable(error.to_string())
    }
}

/// Classify a non-success HTTP status.
pub(crate) fn classify_status(status: StatusCode, body: String) -> PeerError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };

    match status {
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE => {
            PeerError::Unavailable(message)
        }
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => {
            PeerError::DeadlineExceeded(message)
        }
        StatusCode::TOO_MANY_REQUESTS => PeerError::ResourceExhausted(message),
        StatusCode::NOT_FOUND => PeerError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            PeerError::InvalidArgument(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PeerError::PermissionDenied(message),
        s if s.is_server_error() => PeerError::Unavailable(message),
        _ => PeerError::InvalidArgument(message),
    }
}

/// Fail on non-success statuses, otherwise decode the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PeerError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(status, body));
    }

    response
        .json()
        .await
        .map_err(|e| PeerError::Malformed(e.to_string()))
}

/// Like [`read_json`] but maps 404 to `None`.
pub(crate) async fn read_optional_json<T: DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, PeerError> {
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    read_json(response).await.map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_peer_error_classes() {
        let cases = [
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
            (StatusCode::BAD_GATEWAY, "unavailable"),
            (StatusCode::INTERNAL_SERVER_ERROR, "unavailable"),
            (StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded"),
            (StatusCode::TOO_MANY_REQUESTS, "resource_exhausted"),
            (StatusCode::NOT_FOUND, "not_found"),
            (StatusCode::BAD_REQUEST, "invalid_argument"),
            (StatusCode::UNPROCESSABLE_ENTITY, "invalid_argument"),
            (StatusCode::UNAUTHORIZED, "permission_denied"),
            (StatusCode::FORBIDDEN, "permission_denied"),
        ];
        for (status, kind) in cases {
            assert_eq!(classify_status(status, String::new()).kind(), kind, "{status}");
        }
    }

    #[test]
    fn body_is_kept_in_the_message() {
        let err = classify_status(StatusCode::BAD_REQUEST, "missing packId".into());
        assert_eq!(
            err,
            PeerError::InvalidArgument("400 Bad Request: missing packId".into())
        );
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        assert_eq!(normalize_base_url("http://id:8081/"), "http://id:8081");
    }
}
