//! Bitget Profile
//!
//! Spot public stream, v2 API. No token handshake; keepalive is the bare
//! text word `ping`, answered with `pong`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::application::ports::{ExchangeProfile, FrameKind, KeepaliveFrame, ProfileError};
use crate::domain::Channel;

const WS_URL: &str = "wss://ws.bitget.com/v2/ws/public";

/// Bitget spot adapter.
#[derive(Debug, Clone)]
pub struct BitgetProfile {
    ws_url: String,
}

impl Default for BitgetProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl BitgetProfile {
    /// Create a profile against the production endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ws_url: WS_URL.to_string(),
        }
    }

    /// Override the endpoint (tests, mirrors).
    #[must_use]
    pub fn with_ws_url(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    const fn channel_name(channel: Channel) -> &'static str {
        match channel {
            Channel::Ticker => "ticker",
            Channel::Trade => "trade",
            // Single-level book is enough for a best-bid/ask observation.
            Channel::Depth => "books1",
        }
    }
}

#[async_trait]
impl ExchangeProfile for BitgetProfile {
    fn name(&self) -> &'static str {
        "bitget"
    }

    async fn resolve_endpoint(&self) -> Result<String, ProfileError> {
        Ok(self.ws_url.clone())
    }

    fn subscribe_payload(&self, symbol: &str, channel: Channel) -> String {
        json!({
            "op": "subscribe",
            "args": [{
                "instType": "SPOT",
                "channel": Self::channel_name(channel),
                "instId": symbol,
            }]
        })
        .to_string()
    }

    fn classify(&self, payload: &serde_json::Value) -> FrameKind {
        if payload.as_str() == Some("pong") {
            return FrameKind::Pong;
        }
        match payload.get("event").and_then(|v| v.as_str()) {
            Some("subscribe") => return FrameKind::SubscriptionAck,
            Some("error") => {
                let msg = payload
                    .get("msg")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                return FrameKind::SubscriptionRejected(msg.to_string());
            }
            _ => {}
        }
        if payload.get("data").is_some() && payload.get("arg").is_some() {
            return FrameKind::Data;
        }
        FrameKind::Other
    }

    fn keepalive_frame(&self) -> KeepaliveFrame {
        KeepaliveFrame::Text("ping".to_string())
    }

    fn extract_price(&self, channel: Channel, payload: &serde_json::Value) -> Option<Decimal> {
        let entry = payload.get("data")?.as_array()?.first()?;
        let text = match channel {
            Channel::Ticker => entry.get("lastPr")?.as_str()?,
            Channel::Trade => entry.get("price")?.as_str()?,
            Channel::Depth => best_level(entry)?,
        };
        text.parse().ok()
    }

    fn source_timestamp(&self, payload: &serde_json::Value) -> Option<DateTime<Utc>> {
        let ts = payload.get("ts")?;
        let millis = ts.as_i64().or_else(|| ts.as_str()?.parse().ok())?;
        DateTime::from_timestamp_millis(millis)
    }
}

/// Best bid price, falling back to best ask on an empty bid side.
fn best_level(entry: &serde_json::Value) -> Option<&str> {
    ["bids", "asks"]
        .iter()
        .find_map(|side| entry.get(*side)?.as_array()?.first()?.get(0)?.as_str())
}
