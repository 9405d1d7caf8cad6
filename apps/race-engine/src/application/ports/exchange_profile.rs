//! Exchange Profile Port (Driven Port)
//!
//! The per-exchange strategy bundle. The orchestration logic is written once;
//! everything an exchange does differently (endpoint resolution and
//! ephemeral token issuance, subscription topic naming, acknowledgement and
//! heartbeat shapes, payload field extraction) lives behind this trait,
//! implemented once per exchange as a small adapter object.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::Channel;

/// Errors raised while resolving an exchange endpoint.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProfileError {
    /// Ephemeral access token could not be issued.
    #[error("token issuance failed: {0}")]
    TokenIssuance(String),
}

/// Classification of one decoded inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// The subscription was acknowledged.
    SubscriptionAck,
    /// The subscription was rejected with a reason.
    SubscriptionRejected(String),
    /// Heartbeat acknowledgement (application-level pong).
    Pong,
    /// A market-data frame.
    Data,
    /// Anything else (welcome banners, unrelated system frames).
    Other,
}

/// Keepalive frame an exchange expects on the heartbeat period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepaliveFrame {
    /// Protocol-level WebSocket ping.
    ProtocolPing,
    /// Application-level text payload (e.g. `"ping"` or a JSON ping message).
    Text(String),
}

/// Per-exchange strategy bundle.
#[async_trait]
pub trait ExchangeProfile: Send + Sync {
    /// Exchange name for logs and telemetry.
    fn name(&self) -> &'static str;

    /// Resolve the WebSocket endpoint to dial, issuing an ephemeral access
    /// token first where the exchange requires one.
    async fn resolve_endpoint(&self) -> Result<String, ProfileError>;

    /// Build the subscription request payload for a symbol and channel.
    fn subscribe_payload(&self, symbol: &str, channel: Channel) -> String;

    /// Classify a decoded inbound payload.
    fn classify(&self, payload: &serde_json::Value) -> FrameKind;

    /// The keepalive frame this exchange expects.
    fn keepalive_frame(&self) -> KeepaliveFrame;

    /// Extract the price observation from a data frame, best bid/ask for
    /// depth channels. `None` when the payload carries no usable price.
    fn extract_price(&self, channel: Channel, payload: &serde_json::Value) -> Option<Decimal>;

    /// Exchange-reported event time of a data frame, when present.
    fn source_timestamp(&self, payload: &serde_json::Value) -> Option<DateTime<Utc>> {
        let _ = payload;
        None
    }
}
