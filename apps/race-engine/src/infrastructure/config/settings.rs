//! Engine Configuration Settings
//!
//! Configuration types for one capture-and-race run, loaded from
//! environment variables.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{Channel, CounterSpec, OrderSide, RaceSpec, TimeInForce, WinnerRule};
use crate::infrastructure::exchanges::ExchangeId;
use crate::infrastructure::stream::{ConnectionConfig, HeartbeatConfig, ReconnectConfig};

/// The release event to run, as configured.
#[derive(Debug, Clone)]
pub struct EventSettings {
    /// Exchange symbol of the pair going live.
    pub symbol: String,
    /// The instant the pair becomes tradable.
    pub target_at: DateTime<Utc>,
    /// Discovery source tag.
    pub discovered_from: String,
}

/// WebSocket connection settings.
#[derive(Debug, Clone)]
pub struct WebSocketSettings {
    /// Keepalive period.
    pub heartbeat_interval: Duration,
    /// Consecutive unacknowledged keepalives tolerated.
    pub max_missed_heartbeats: u32,
    /// Bound on the subscription acknowledgement wait.
    pub ack_timeout: Duration,
    /// Initial reconnection delay.
    pub reconnect_delay_base: Duration,
    /// Maximum reconnection delay.
    pub reconnect_delay_max: Duration,
    /// Reconnection delay multiplier for exponential backoff.
    pub reconnect_delay_multiplier: f64,
    /// Reconnection attempt bound.
    pub max_reconnect_attempts: u32,
    /// Capacity of the consumer frame channel.
    pub frame_buffer: usize,
}

impl Default for WebSocketSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(15),
            max_missed_heartbeats: 2,
            ack_timeout: Duration::from_secs(5),
            reconnect_delay_base: Duration::from_millis(500),
            reconnect_delay_max: Duration::from_secs(30),
            reconnect_delay_multiplier: 2.0,
            max_reconnect_attempts: 5,
            frame_buffer: 1024,
        }
    }
}

impl WebSocketSettings {
    /// Build the connection tuning from these settings.
    #[must_use]
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            ack_timeout: self.ack_timeout,
            frame_buffer: self.frame_buffer,
            heartbeat: HeartbeatConfig {
                interval: self.heartbeat_interval,
                max_missed: self.max_missed_heartbeats,
            },
            reconnect: ReconnectConfig {
                base_delay: self.reconnect_delay_base,
                max_delay: self.reconnect_delay_max,
                multiplier: self.reconnect_delay_multiplier,
                jitter_factor: 0.1,
                max_attempts: self.max_reconnect_attempts,
            },
        }
    }
}

/// Capture window settings.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// How close to the target the coarse countdown hands over; large
    /// enough to amortize connection setup before the event.
    pub near_threshold: Duration,
    /// Bound on the wait for the first tick after the target.
    pub max_wait: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            near_threshold: Duration::from_secs(25),
            max_wait: Duration::from_secs(5),
        }
    }
}

/// Complete engine configuration for one run.
#[derive(Debug, Clone)]
pub struct RacerConfig {
    /// Exchange to run against.
    pub exchange: ExchangeId,
    /// The release event.
    pub event: EventSettings,
    /// Market-data channel to capture from.
    pub channel: Channel,
    /// WebSocket tuning.
    pub websocket: WebSocketSettings,
    /// Capture window tuning.
    pub capture: CaptureSettings,
    /// Race ladder specification.
    pub race: RaceSpec,
    /// Reconciliation specification.
    pub counter: CounterSpec,
    /// Artificial latency of the dry-run gateway.
    pub dry_run_latency: Duration,
}

impl Default for RacerConfig {
    fn default() -> Self {
        Self {
            exchange: ExchangeId::Bitget,
            event: EventSettings {
                symbol: String::new(),
                target_at: Utc::now(),
                discovered_from: "manual".to_string(),
            },
            channel: Channel::Ticker,
            websocket: WebSocketSettings::default(),
            capture: CaptureSettings::default(),
            race: RaceSpec {
                count: 3,
                side: OrderSide::Buy,
                price_offset_percent: Decimal::NEGATIVE_ONE,
                time_in_force: TimeInForce::Gtc,
            },
            counter: CounterSpec {
                markup_percent: Decimal::ONE,
                fee_percent: Decimal::new(1, 1),
                time_in_force: TimeInForce::Gtc,
                winner_rule: WinnerRule::SubmissionOrder,
            },
            dry_run_latency: Duration::from_millis(30),
        }
    }
}
