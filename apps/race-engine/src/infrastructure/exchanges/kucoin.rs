//! KuCoin Profile
//!
//! Spot public stream. KuCoin gates its WebSocket behind an ephemeral token
//! issued over HTTPS (`/api/v1/bullet-public`); the token and the server
//! endpoint both come from that call. Keepalives are JSON ping messages.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::application::ports::{ExchangeProfile, FrameKind, KeepaliveFrame, ProfileError};
use crate::domain::Channel;

const REST_URL: &str = "https://api.kucoin.com";

/// KuCoin spot adapter.
#[derive(Debug, Clone)]
pub struct KucoinProfile {
    rest_url: String,
    http: reqwest::Client,
}

impl Default for KucoinProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl KucoinProfile {
    /// Create a profile against the production endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rest_url: REST_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Override the REST base (tests, mirrors).
    #[must_use]
    pub fn with_rest_url(rest_url: impl Into<String>) -> Self {
        Self {
            rest_url: rest_url.into(),
            http: reqwest::Client::new(),
        }
    }

    fn topic(symbol: &str, channel: Channel) -> String {
        match channel {
            Channel::Ticker => format!("/market/ticker:{symbol}"),
            Channel::Trade => format!("/market/match:{symbol}"),
            Channel::Depth => format!("/spotMarket/level2Depth5:{symbol}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BulletResponse {
    code: String,
    data: Option<BulletData>,
}

#[derive(Debug, Deserialize)]
struct BulletData {
    token: String,
    #[serde(rename = "instanceServers")]
    instance_servers: Vec<InstanceServer>,
}

#[derive(Debug, Deserialize)]
struct InstanceServer {
    endpoint: String,
}

/// Turn a bullet response into a dialable endpoint.
fn endpoint_from_bullet(bullet: &BulletResponse) -> Result<String, ProfileError> {
    if bullet.code != "200000" {
        return Err(ProfileError::TokenIssuance(format!(
            "bullet-public returned code {}",
            bullet.code
        )));
    }
    let data = bullet
        .data
        .as_ref()
        .ok_or_else(|| ProfileError::TokenIssuance("bullet-public carried no data".to_string()))?;
    let server = data.instance_servers.first().ok_or_else(|| {
        ProfileError::TokenIssuance("bullet-public listed no instance servers".to_string())
    })?;
    Ok(format!(
        "{}?token={}&connectId={}",
        server.endpoint,
        data.token,
        Uuid::new_v4()
    ))
}

#[async_trait]
impl ExchangeProfile for KucoinProfile {
    fn name(&self) -> &'static str {
        "kucoin"
    }

    async fn resolve_endpoint(&self) -> Result<String, ProfileError> {
        let response = self
            .http
            .post(format!("{}/api/v1/bullet-public", self.rest_url))
            .send()
            .await
            .map_err(|e| ProfileError::TokenIssuance(e.to_string()))?;
        let bullet: BulletResponse = response
            .json()
            .await
            .map_err(|e| ProfileError::TokenIssuance(e.to_string()))?;
        endpoint_from_bullet(&bullet)
    }

    fn subscribe_payload(&self, symbol: &str, channel: Channel) -> String {
        json!({
            "id": Uuid::new_v4().to_string(),
            "type": "subscribe",
            "topic": Self::topic(symbol, channel),
            "privateChannel": false,
            "response": true,
        })
        .to_string()
    }

    fn classify(&self, payload: &serde_json::Value) -> FrameKind {
        match payload.get("type").and_then(|v| v.as_str()) {
            Some("ack") => FrameKind::SubscriptionAck,
            Some("error") => {
                let detail = payload
                    .get("data")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                FrameKind::SubscriptionRejected(detail.to_string())
            }
            Some("pong") => FrameKind::Pong,
            Some("message") => FrameKind::Data,
            // "welcome" and anything unrecognized.
            _ => FrameKind::Other,
        }
    }

    fn keepalive_frame(&self) -> KeepaliveFrame {
        KeepaliveFrame::Text(
            json!({"id": Uuid::new_v4().to_string(), "type": "ping"}).to_string(),
        )
    }

    fn extract_price(&self, channel: Channel, payload: &serde_json::Value) -> Option<Decimal> {
        let data = payload.get("data")?;
        let text = match channel {
            Channel::Ticker | Channel::Trade => data.get("price")?.as_str()?,
            Channel::Depth => data.get("bids")?.as_array()?.first()?.get(0)?.as_str()?,
        };
        text.parse().ok()
    }

    fn source_timestamp(&self, payload: &serde_json::Value) -> Option<DateTime<Utc>> {
        let time = payload.get("data")?.get("time")?.as_i64()?;
        DateTime::from_timestamp_millis(time)
    }
}
