//! Capture Window
//!
//! Answers one question: what is the first valid price observed at or after
//! the target instant, within a bounded wait window? Returns at most one
//! captured price per invocation and tears the connection down on every
//! exit path.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::ports::OutcomeSink;
use crate::application::services::TickFilter;
use crate::domain::{CapturedPrice, ReleaseEvent, Tick};
use crate::infrastructure::clock::Scheduler;
use crate::infrastructure::config::CaptureSettings;
use crate::infrastructure::stream::{StreamConnection, SubscriptionSpec};

/// One-shot first-tick capture.
pub struct CaptureWindow {
    scheduler: Scheduler,
    settings: CaptureSettings,
    sink: Arc<dyn OutcomeSink>,
}

impl CaptureWindow {
    /// Create a window with the default scheduler.
    #[must_use]
    pub fn new(settings: CaptureSettings, sink: Arc<dyn OutcomeSink>) -> Self {
        Self {
            scheduler: Scheduler::default(),
            settings,
            sink,
        }
    }

    /// Capture the first valid price at or after the event's target instant.
    ///
    /// The countdown hands over well before the event so connection setup is
    /// amortized; the final approach is a short-sleep spin. A target already
    /// in the past degrades to "first tick after now" by design, so late
    /// discovery never deadlocks the caller.
    ///
    /// Returns `None` on connection failure or when the window elapses with
    /// no tick; the caller must treat that as "abort this event, do not
    /// place orders".
    pub async fn capture(
        &self,
        connection: &mut StreamConnection,
        filter: &TickFilter,
        event: &ReleaseEvent,
        cancel: &CancellationToken,
    ) -> Option<CapturedPrice> {
        let target = event.target_instant;

        self.scheduler
            .wait_until_near(target, self.settings.near_threshold, cancel)
            .await;
        if cancel.is_cancelled() {
            return None;
        }

        let spec = SubscriptionSpec {
            symbol: event.symbol.clone(),
            channel: filter.channel(),
        };
        if let Err(e) = connection.connect(spec).await {
            // The window is time-boxed; no open-ended retries here.
            tracing::warn!(symbol = %event.symbol, error = %e, "capture connect failed");
            connection.cleanup().await;
            return None;
        }
        let Some(mut frames) = connection.receive() else {
            connection.cleanup().await;
            return None;
        };

        // Anchor the window at the target, or at "now" for a late start.
        let cutoff = target.max(Utc::now());
        self.scheduler.spin_until(target).await;

        let tick = self
            .first_tick_in_window(filter, &mut frames, cutoff, cancel)
            .await;
        connection.cleanup().await;

        tick.map(|tick| {
            let captured = CapturedPrice::from_tick(&tick, target);
            tracing::info!(
                symbol = %event.symbol,
                price = %captured.value,
                latency_ms = captured.latency_from_target.as_millis(),
                "first tick captured"
            );
            captured
        })
    }

    /// Consume the stream until the first tick received at or after
    /// `cutoff`, bounded by `cutoff + max_wait`.
    async fn first_tick_in_window(
        &self,
        filter: &TickFilter,
        frames: &mut tokio::sync::mpsc::Receiver<crate::domain::RawMessage>,
        cutoff: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Option<Tick> {
        let window_end = cutoff
            + chrono::TimeDelta::from_std(self.settings.max_wait).unwrap_or_default();

        loop {
            let remaining = (window_end - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            if remaining.is_zero() {
                tracing::warn!("capture window elapsed without a tick");
                return None;
            }

            tokio::select! {
                () = cancel.cancelled() => return None,
                next = tokio::time::timeout(remaining, filter.next_tick(frames)) => {
                    match next {
                        Ok(Some(tick)) => {
                            self.sink.record_tick(&tick);
                            if tick.received_at >= cutoff {
                                return Some(tick);
                            }
                            // Stale observation from before the window anchor.
                            tracing::debug!(price = %tick.price, "discarding pre-window tick");
                        }
                        Ok(None) => {
                            tracing::warn!("stream ended before a tick was captured");
                            return None;
                        }
                        Err(_elapsed) => {
                            tracing::warn!("capture window elapsed without a tick");
                            return None;
                        }
                    }
                }
            }
        }
    }
}
