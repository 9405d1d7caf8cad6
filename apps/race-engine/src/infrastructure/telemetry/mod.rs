//! Telemetry
//!
//! Tracing initialization for the binary and sink implementations that turn
//! captured ticks and race outcomes into structured log records. Persistence
//! proper is an external collaborator's concern; these sinks only observe.

use tracing_subscriber::EnvFilter;

use crate::application::ports::OutcomeSink;
use crate::domain::{RaceOutcome, Tick};

/// Initialize the tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info`. Call once, from the binary.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Sink that emits every record as a structured tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    /// Create a sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl OutcomeSink for TracingSink {
    fn record_tick(&self, tick: &Tick) {
        tracing::info!(
            target: "telemetry",
            price = %tick.price,
            channel = %tick.channel,
            received_at = %tick.received_at,
            "tick"
        );
    }

    fn record_outcome(&self, outcome: &RaceOutcome) {
        match serde_json::to_string(outcome) {
            Ok(json) => {
                tracing::info!(target: "telemetry", outcome = %json, "race outcome");
            }
            Err(e) => {
                tracing::warn!(target: "telemetry", error = %e, "race outcome not serializable");
            }
        }
    }
}
