//! Outcome Sink Port (Driven Port)
//!
//! Optional telemetry receiver for captured ticks and race outcomes. The
//! core never depends on a sink succeeding; sink methods are infallible from
//! the caller's perspective.

use crate::domain::{RaceOutcome, Tick};

/// Receiver for observability records.
pub trait OutcomeSink: Send + Sync {
    /// Record one observed tick.
    fn record_tick(&self, tick: &Tick);

    /// Record the terminal outcome of one race.
    fn record_outcome(&self, outcome: &RaceOutcome);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpSink;

impl OutcomeSink for NoOpSink {
    fn record_tick(&self, _tick: &Tick) {}

    fn record_outcome(&self, _outcome: &RaceOutcome) {}
}
