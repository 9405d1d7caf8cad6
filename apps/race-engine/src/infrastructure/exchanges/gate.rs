//! Gate.io Profile
//!
//! Spot stream, v4 API. No token handshake; keepalive is a JSON
//! `spot.ping` message answered on the `spot.pong` channel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::application::ports::{ExchangeProfile, FrameKind, KeepaliveFrame, ProfileError};
use crate::domain::Channel;

const WS_URL: &str = "wss://api.gateio.ws/ws/v4/";

/// Gate.io spot adapter.
#[derive(Debug, Clone)]
pub struct GateProfile {
    ws_url: String,
}

impl Default for GateProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl GateProfile {
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
            Channel::Ticker => "spot.tickers",
            Channel::Trade => "spot.trades",
            // Best bid/ask feed; full book depth is not needed for one
            // price observation.
            Channel::Depth => "spot.book_ticker",
        }
    }
}

#[async_trait]
impl ExchangeProfile for GateProfile {
    fn name(&self) -> &'static str {
        "gate"
    }

    async fn resolve_endpoint(&self) -> Result<String, ProfileError> {
        Ok(self.ws_url.clone())
    }

    fn subscribe_payload(&self, symbol: &str, channel: Channel) -> String {
        json!({
            "time": Utc::now().timestamp(),
            "channel": Self::channel_name(channel),
            "event": "subscribe",
            "payload": [symbol],
        })
        .to_string()
    }

    fn classify(&self, payload: &serde_json::Value) -> FrameKind {
        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            let message = error
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return FrameKind::SubscriptionRejected(message.to_string());
        }
        if payload.get("channel").and_then(|v| v.as_str()) == Some("spot.pong") {
            return FrameKind::Pong;
        }
        match payload.get("event").and_then(|v| v.as_str()) {
            Some("subscribe") => FrameKind::SubscriptionAck,
            Some("update") => FrameKind::Data,
            _ => FrameKind::Other,
        }
    }

    fn keepalive_frame(&self) -> KeepaliveFrame {
        KeepaliveFrame::Text(
            json!({"time": Utc::now().timestamp(), "channel": "spot.ping"}).to_string(),
        )
    }

    fn extract_price(&self, channel: Channel, payload: &serde_json::Value) -> Option<Decimal> {
        let result = payload.get("result")?;
        let text = match channel {
            Channel::Ticker => result.get("last")?.as_str()?,
            Channel::Trade => result.get("price")?.as_str()?,
            Channel::Depth => result.get("b")?.as_str()?,
        };
        text.parse().ok()
    }

    fn source_timestamp(&self, payload: &serde_json::Value) -> Option<DateTime<Utc>> {
        if let Some(millis) = payload.get("time_ms").and_then(|v| v.as_i64()) {
            return DateTime::from_timestamp_millis(millis);
        }
        let secs = payload.get("time")?.as_i64()?;
        DateTime::from_timestamp(secs, 0)
    }
}
