//! Event broker producer over an HTTP REST proxy.
//!
//! `POST {base}/topics/{topic}` with `{"records":[{"key":..,"value":..}]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::infrastructure::peers::{http_client, normalize_base_url};
use crate::infrastructure::ports::{BrokerError, BrokerPort};

#[derive(Clone)]
pub struct HttpBroker {
    client: Client,
    base_url: String,
}

impl HttpBroker {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: normalize_base_url(base_url),
        }
    }
}

#[derive(Serialize)]
struct ProduceRequest<'a> {
    records: [ProduceRecord<'a>; 1],
}

#[derive(Serialize)]
struct ProduceRecord<'a> {
    key: &'a str,
    value: Value,
}

fn produce_body(key: &str, value: Value) -> ProduceRequest<'_> {
    ProduceRequest {
        records: [ProduceRecord { key, value }],
    }
}

#[async_trait]
impl BrokerPort for HttpBroker {
    async fn publish(&self, topic: &str, key: &str, payload: String) -> Result<(), BrokerError> {
        let value: Value = serde_json::from_str(&payload)
            .map_err(|e| BrokerError::Serialization(e.to_string()))?;

        let response = self
            .client
            .post(format!("{}/topics/{}", self.base_url, topic))
            .json(&produce_body(key, value))
            .send()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            Err(BrokerError::Unavailable(format!("{status}: {body}")))
        } else {
            Err(BrokerError::Rejected(format!("{status}: {body}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produce_body_embeds_value_as_json() {
        let value = serde_json::json!({"type": "ROOM_CREATED"});
        let json = serde_json::to_value(produce_body("room-1", value)).unwrap();
        assert_eq!(json["records"][0]["key"], "room-1");
        assert_eq!(json["records"][0]["value"]["type"], "ROOM_CREATED");
    }
}
