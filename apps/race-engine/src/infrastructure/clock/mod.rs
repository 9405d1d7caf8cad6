//! Countdown Clock
//!
//! Produces wake-ups that get coarser further from the target instant and
//! finer close to it: coarse re-measured sleeps while minutes remain, then a
//! short-sleep spin for the final approach. The spin is deliberate;
//! sub-millisecond precision near the event is the whole point.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Default coarse sleep increment while far from the target.
const DEFAULT_COARSE_STEP: Duration = Duration::from_secs(2);

/// Default sleep increment for the final spin.
const DEFAULT_SPIN_STEP: Duration = Duration::from_micros(500);

/// Two-phase countdown scheduler.
#[derive(Debug, Clone)]
pub struct Scheduler {
    coarse_step: Duration,
    spin_step: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            coarse_step: DEFAULT_COARSE_STEP,
            spin_step: DEFAULT_SPIN_STEP,
        }
    }
}

impl Scheduler {
    /// Create a scheduler with custom steps.
    #[must_use]
    pub const fn new(coarse_step: Duration, spin_step: Duration) -> Self {
        Self {
            coarse_step,
            spin_step,
        }
    }

    /// Sleep in coarse increments until within `threshold` of `target`.
    ///
    /// The gap is re-measured every iteration rather than slept in one fixed
    /// chunk; clock drift and scheduling jitter accumulate over minutes.
    /// Returns immediately when already within the threshold, including when
    /// the target is in the past. Never fails; cancellation returns early.
    pub async fn wait_until_near(
        &self,
        target: DateTime<Utc>,
        threshold: Duration,
        cancel: &CancellationToken,
    ) {
        loop {
            let Ok(remaining) = (target - Utc::now()).to_std() else {
                return;
            };
            if remaining <= threshold {
                return;
            }

            let sleep = self.coarse_step.min(remaining - threshold);
            tokio::select! {
                () = cancel.cancelled() => return,
                () = tokio::time::sleep(sleep) => {}
            }
        }
    }

    /// Spin in very short sleeps until `now() >= target`.
    ///
    /// Minimizes scheduler-induced overshoot versus longer sleeps; exits
    /// immediately for a target in the past.
    pub async fn spin_until(&self, target: DateTime<Utc>) {
        while Utc::now() < target {
            tokio::time::sleep(self.spin_step).await;
        }
    }
}
