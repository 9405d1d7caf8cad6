//! Tick Filter
//!
//! Consumes decoded data frames and yields only valid price observations,
//! each tagged with its local receipt time before any further processing,
//! to preserve latency-measurement fidelity.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::mpsc;

use crate::application::ports::ExchangeProfile;
use crate::domain::{Channel, RawMessage, Tick};

/// Filters a raw message stream down to valid ticks.
///
/// A message whose price field is absent, zero, negative, or non-numeric is
/// skipped and logged to the failure channel, never raised.
pub struct TickFilter {
    profile: Arc<dyn ExchangeProfile>,
    channel: Channel,
}

impl TickFilter {
    /// Create a filter for one channel.
    #[must_use]
    pub fn new(profile: Arc<dyn ExchangeProfile>, channel: Channel) -> Self {
        Self { profile, channel }
    }

    /// The channel this filter extracts from.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Try to turn one raw message into a tick.
    ///
    /// The receipt stamp is taken from the raw message, which was stamped at
    /// decode; queue dwell between the read loop and this filter does not
    /// distort it.
    #[must_use]
    pub fn accept(&self, raw: &RawMessage) -> Option<Tick> {
        let price = match self.profile.extract_price(self.channel, &raw.payload) {
            Some(price) => price,
            None => {
                tracing::debug!(
                    exchange = self.profile.name(),
                    channel = %self.channel,
                    "dropping frame without usable price"
                );
                return None;
            }
        };
        let received_at = raw.received_at;

        if price <= Decimal::ZERO {
            tracing::debug!(
                exchange = self.profile.name(),
                channel = %self.channel,
                %price,
                "dropping frame with non-positive price"
            );
            return None;
        }

        Some(Tick {
            price,
            raw_payload: raw.payload.clone(),
            channel: self.channel,
            source_timestamp: self.profile.source_timestamp(&raw.payload),
            received_at,
        })
    }

    /// Await the next valid tick on the stream. `None` when the stream ends.
    pub async fn next_tick(&self, frames: &mut mpsc::Receiver<RawMessage>) -> Option<Tick> {
        while let Some(raw) = frames.recv().await {
            if let Some(tick) = self.accept(&raw) {
                return Some(tick);
            }
        }
        None
    }
}
