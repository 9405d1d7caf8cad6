//! Engine Configuration
//!
//! Loads one run's configuration from environment variables. `from_env`
//! reads the process environment; `from_lookup` takes any name-to-value
//! function so loading stays testable without mutating process state.

pub mod settings;

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{Channel, CounterSpec, OrderSide, RaceSpec, TimeInForce, WinnerRule};
use crate::infrastructure::exchanges::ExchangeId;

pub use settings::{CaptureSettings, EventSettings, RacerConfig, WebSocketSettings};

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// A variable was present but unusable.
    #[error("invalid value for {var}: {message}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// What was wrong with it.
        message: String,
    },
}

impl RacerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary name-to-value lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let loader = Loader { lookup };

        let exchange_name = loader.required("RACE_EXCHANGE")?;
        let exchange = ExchangeId::from_str_case_insensitive(&exchange_name).ok_or_else(|| {
            ConfigError::InvalidValue {
                var: "RACE_EXCHANGE".to_string(),
                message: format!("unknown exchange {exchange_name}"),
            }
        })?;

        let symbol = loader.required("RACE_SYMBOL")?;
        let target_at = loader.rfc3339("RACE_TARGET_AT")?;

        let race = RaceSpec {
            count: loader.parse_or("RACE_COUNT", 3usize)?,
            side: OrderSide::from_str_case_insensitive(
                &loader.or_default("RACE_SIDE", "buy"),
            ),
            price_offset_percent: loader.parse_or("RACE_OFFSET_PCT", Decimal::NEGATIVE_ONE)?,
            time_in_force: TimeInForce::from_str_case_insensitive(
                &loader.or_default("RACE_TIF", "gtc"),
            ),
        };

        let counter = CounterSpec {
            markup_percent: loader.parse_or("COUNTER_MARKUP_PCT", Decimal::ONE)?,
            fee_percent: loader.parse_or("COUNTER_FEE_PCT", Decimal::new(1, 1))?,
            time_in_force: TimeInForce::from_str_case_insensitive(
                &loader.or_default("COUNTER_TIF", "gtc"),
            ),
            winner_rule: WinnerRule::from_str_case_insensitive(
                &loader.or_default("RACE_WINNER_RULE", "submission_order"),
            ),
        };

        let websocket = WebSocketSettings {
            heartbeat_interval: loader.secs_or("WS_HEARTBEAT_INTERVAL_SECS", 15)?,
            max_missed_heartbeats: loader.parse_or("WS_MAX_MISSED_HEARTBEATS", 2u32)?,
            ack_timeout: loader.millis_or("WS_ACK_TIMEOUT_MS", 5_000)?,
            reconnect_delay_base: loader.millis_or("WS_RECONNECT_BASE_MS", 500)?,
            reconnect_delay_max: loader.secs_or("WS_RECONNECT_MAX_SECS", 30)?,
            reconnect_delay_multiplier: loader.parse_or("WS_RECONNECT_MULTIPLIER", 2.0f64)?,
            max_reconnect_attempts: loader.parse_or("WS_MAX_RECONNECT_ATTEMPTS", 5u32)?,
            frame_buffer: loader.parse_or("WS_FRAME_BUFFER", 1024usize)?,
        };

        let capture = CaptureSettings {
            near_threshold: loader.secs_or("CAPTURE_NEAR_THRESHOLD_SECS", 25)?,
            max_wait: loader.millis_or("CAPTURE_MAX_WAIT_MS", 5_000)?,
        };

        Ok(Self {
            exchange,
            event: EventSettings {
                symbol,
                target_at,
                discovered_from: loader.or_default("RACE_DISCOVERED_FROM", "manual"),
            },
            channel: Channel::from_str_case_insensitive(
                &loader.or_default("RACE_CHANNEL", "ticker"),
            ),
            websocket,
            capture,
            race,
            counter,
            dry_run_latency: loader.millis_or("DRY_RUN_LATENCY_MS", 30)?,
        })
    }
}

struct Loader<F> {
    lookup: F,
}

impl<F> Loader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, var: &str) -> Result<String, ConfigError> {
        (self.lookup)(var).ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    }

    fn or_default(&self, var: &str, default: &str) -> String {
        (self.lookup)(var).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, var: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (self.lookup)(var) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                var: var.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn secs_or(&self, var: &str, default_secs: u64) -> Result<Duration, ConfigError> {
        Ok(Duration::from_secs(self.parse_or(var, default_secs)?))
    }

    fn millis_or(&self, var: &str, default_millis: u64) -> Result<Duration, ConfigError> {
        Ok(Duration::from_millis(self.parse_or(var, default_millis)?))
    }

    fn rfc3339(&self, var: &str) -> Result<DateTime<Utc>, ConfigError> {
        let raw = self.required(var)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ConfigError::InvalidValue {
                var: var.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn minimal_configuration_uses_defaults() {
        let config = RacerConfig::from_lookup(lookup(&[
            ("RACE_EXCHANGE", "bitget"),
            ("RACE_SYMBOL", "NEWUSDT"),
            ("RACE_TARGET_AT", "2026-08-05T12:00:00Z"),
        ]))
        .unwrap();

        assert_eq!(config.exchange, ExchangeId::Bitget);
        assert_eq!(config.event.symbol, "NEWUSDT");
        assert_eq!(config.channel, Channel::Ticker);
        assert_eq!(config.race.count, 3);
        assert_eq!(config.race.side, OrderSide::Buy);
        assert_eq!(config.race.price_offset_percent, dec!(-1));
        assert_eq!(config.websocket.max_reconnect_attempts, 5);
        assert_eq!(config.capture.near_threshold, Duration::from_secs(25));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = RacerConfig::from_lookup(lookup(&[
            ("RACE_EXCHANGE", "kucoin"),
            ("RACE_SYMBOL", "NEW-USDT"),
            ("RACE_TARGET_AT", "2026-08-05T12:00:00+02:00"),
            ("RACE_CHANNEL", "trade"),
            ("RACE_COUNT", "5"),
            ("RACE_SIDE", "sell"),
            ("RACE_OFFSET_PCT", "2.5"),
            ("RACE_WINNER_RULE", "lowest_latency"),
            ("CAPTURE_MAX_WAIT_MS", "2000"),
        ]))
        .unwrap();

        assert_eq!(config.exchange, ExchangeId::Kucoin);
        assert_eq!(config.channel, Channel::Trade);
        assert_eq!(config.race.count, 5);
        assert_eq!(config.race.side, OrderSide::Sell);
        assert_eq!(config.race.price_offset_percent, dec!(2.5));
        assert_eq!(config.counter.winner_rule, WinnerRule::LowestLatency);
        assert_eq!(config.capture.max_wait, Duration::from_millis(2000));
        // Offset-aware timezone is normalized to UTC.
        assert_eq!(
            config.event.target_at,
            DateTime::parse_from_rfc3339("2026-08-05T10:00:00Z").unwrap()
        );
    }

    #[test]
    fn missing_required_variable() {
        let err = RacerConfig::from_lookup(lookup(&[("RACE_EXCHANGE", "bitget")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(var) if var == "RACE_SYMBOL"));
    }

    #[test]
    fn unknown_exchange_rejected() {
        let err = RacerConfig::from_lookup(lookup(&[
            ("RACE_EXCHANGE", "nasdaq"),
            ("RACE_SYMBOL", "NEWUSDT"),
            ("RACE_TARGET_AT", "2026-08-05T12:00:00Z"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "RACE_EXCHANGE"));
    }

    #[test]
    fn malformed_timestamp_rejected() {
        let err = RacerConfig::from_lookup(lookup(&[
            ("RACE_EXCHANGE", "gate"),
            ("RACE_SYMBOL", "NEW_USDT"),
            ("RACE_TARGET_AT", "tomorrow at noon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "RACE_TARGET_AT"));
    }

    #[test]
    fn malformed_number_rejected() {
        let err = RacerConfig::from_lookup(lookup(&[
            ("RACE_EXCHANGE", "bitget"),
            ("RACE_SYMBOL", "NEWUSDT"),
            ("RACE_TARGET_AT", "2026-08-05T12:00:00Z"),
            ("RACE_COUNT", "three"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var, .. } if var == "RACE_COUNT"));
    }
}
