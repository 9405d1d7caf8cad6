//! Market Data Records
//!
//! Channels, ticks, captured prices, and the connection state machine that
//! drives all downstream behavior of a stream connection.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Realtime market-data channel to subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Last-price ticker updates.
    #[default]
    Ticker,
    /// Individual trade prints.
    Trade,
    /// Order book depth (best bid/ask is used as the price observation).
    Depth,
}

impl Channel {
    /// Parse a channel name, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trade" => Self::Trade,
            "depth" => Self::Depth,
            _ => Self::Ticker,
        }
    }

    /// Canonical channel name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ticker => "ticker",
            Self::Trade => "trade",
            Self::Depth => "depth",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a stream connection.
///
/// Owned exclusively by the connection; no other component forces a
/// transition except the owner triggering `Closed` during teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport open.
    #[default]
    Disconnected,
    /// Transport dial and subscription handshake in progress.
    Connecting,
    /// Subscription acknowledged, no data frame seen yet.
    Subscribed,
    /// At least one data frame received.
    Streaming,
    /// Connection lost; reconnect attempts in progress.
    Reconnecting,
    /// Torn down, either deliberately or after reconnects were exhausted.
    Closed,
}

impl ConnectionState {
    /// Whether the connection has an acknowledged subscription.
    #[must_use]
    pub const fn is_subscribed(&self) -> bool {
        matches!(self, Self::Subscribed | Self::Streaming)
    }

    /// Whether the connection is permanently done.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Streaming => "streaming",
            Self::Reconnecting => "reconnecting",
            Self::Closed => "closed",
        };
        write!(f, "{name}")
    }
}

/// One decoded data frame from the wire, before price extraction.
///
/// `received_at` is stamped the moment the frame is decoded off the wire,
/// before any queuing, so downstream latency measurement is not skewed by
/// channel dwell time.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Decoded JSON payload of the frame.
    pub payload: serde_json::Value,
    /// Local receipt time, stamped at decode.
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    /// Wrap a freshly decoded payload, stamping the receipt time.
    #[must_use]
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            payload,
            received_at: Utc::now(),
        }
    }
}

/// One valid price observation from a market-data channel.
///
/// `received_at` is stamped at the moment of extraction, before any further
/// processing, to preserve latency-measurement fidelity.
#[derive(Debug, Clone, Serialize)]
pub struct Tick {
    /// Observed price.
    pub price: Decimal,
    /// Raw payload the price was extracted from.
    pub raw_payload: serde_json::Value,
    /// Channel the observation came from.
    pub channel: Channel,
    /// Exchange-reported event time, when the payload carries one.
    pub source_timestamp: Option<DateTime<Utc>>,
    /// Local receipt time.
    pub received_at: DateTime<Utc>,
}

/// The reference price captured for one release event.
///
/// Created at most once per capture window and never revised.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedPrice {
    /// The first valid price observed at or after the target instant.
    pub value: Decimal,
    /// When the observation was received locally.
    pub captured_at: DateTime<Utc>,
    /// Delay between the target instant and the observation.
    pub latency_from_target: Duration,
}

impl CapturedPrice {
    /// Build a captured price from the winning tick.
    #[must_use]
    pub fn from_tick(tick: &Tick, target_instant: DateTime<Utc>) -> Self {
        let latency = (tick.received_at - target_instant)
            .to_std()
            .unwrap_or(Duration::ZERO);
        Self {
            value: tick.price,
            captured_at: tick.received_at,
            latency_from_target: latency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    #[test]
    fn channel_parse() {
        assert_eq!(Channel::from_str_case_insensitive("TRADE"), Channel::Trade);
        assert_eq!(Channel::from_str_case_insensitive("depth"), Channel::Depth);
        assert_eq!(Channel::from_str_case_insensitive("bogus"), Channel::Ticker);
    }

    #[test]
    fn connection_state_predicates() {
        assert!(ConnectionState::Subscribed.is_subscribed());
        assert!(ConnectionState::Streaming.is_subscribed());
        assert!(!ConnectionState::Reconnecting.is_subscribed());
        assert!(ConnectionState::Closed.is_closed());
        assert!(!ConnectionState::Disconnected.is_closed());
    }

    #[test]
    fn captured_price_latency_from_tick() {
        let target = Utc::now();
        let tick = Tick {
            price: dec!(1.2345),
            raw_payload: serde_json::json!({}),
            channel: Channel::Ticker,
            source_timestamp: None,
            received_at: target + TimeDelta::milliseconds(12),
        };

        let captured = CapturedPrice::from_tick(&tick, target);
        assert_eq!(captured.value, dec!(1.2345));
        assert_eq!(captured.latency_from_target, Duration::from_millis(12));
    }

    #[test]
    fn captured_price_before_target_clamps_to_zero() {
        // Late-discovered events capture against "now"; a tick stamped just
        // before the original target must not underflow the latency.
        let target = Utc::now();
        let tick = Tick {
            price: dec!(0.5),
            raw_payload: serde_json::json!({}),
            channel: Channel::Trade,
            source_timestamp: None,
            received_at: target - TimeDelta::milliseconds(5),
        };

        let captured = CapturedPrice::from_tick(&tick, target);
        assert_eq!(captured.latency_from_target, Duration::ZERO);
    }
}
