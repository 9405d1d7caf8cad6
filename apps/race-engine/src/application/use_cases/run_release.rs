//! Release Runner
//!
//! The one entry point for a release event: gate on the countdown, capture
//! the first tick, race the ladder, reconcile the fills, and hand the
//! outcome to the telemetry sink. A failed capture aborts order placement
//! entirely; no order is ever fired without a reference price.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    ExchangeProfile, MarketTransport, OrderGateway, OutcomeSink, SizingPolicy,
};
use crate::application::services::TickFilter;
use crate::domain::{Channel, CounterSpec, RaceOutcome, RaceSpec, ReleaseEvent};
use crate::infrastructure::config::CaptureSettings;
use crate::infrastructure::stream::{ConnectionConfig, StreamConnection};

use super::{CaptureWindow, OrderRacer, Reconciler};

/// Orchestrates one capture-and-race run end to end.
pub struct ReleaseRunner {
    profile: Arc<dyn ExchangeProfile>,
    transport: Arc<dyn MarketTransport>,
    gateway: Arc<dyn OrderGateway>,
    sizing: Arc<dyn SizingPolicy>,
    sink: Arc<dyn OutcomeSink>,
    connection_config: ConnectionConfig,
    capture_settings: CaptureSettings,
    channel: Channel,
    race_spec: RaceSpec,
    counter_spec: CounterSpec,
}

impl ReleaseRunner {
    /// Wire a runner from its injected collaborators.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        profile: Arc<dyn ExchangeProfile>,
        transport: Arc<dyn MarketTransport>,
        gateway: Arc<dyn OrderGateway>,
        sizing: Arc<dyn SizingPolicy>,
        sink: Arc<dyn OutcomeSink>,
        connection_config: ConnectionConfig,
        capture_settings: CaptureSettings,
        channel: Channel,
        race_spec: RaceSpec,
        counter_spec: CounterSpec,
    ) -> Self {
        Self {
            profile,
            transport,
            gateway,
            sizing,
            sink,
            connection_config,
            capture_settings,
            channel,
            race_spec,
            counter_spec,
        }
    }

    /// Run one event to completion.
    ///
    /// `None` means the capture failed and no order was placed. A fresh
    /// connection is created per event; connections are never reused across
    /// events.
    pub async fn run(
        &self,
        event: &ReleaseEvent,
        cancel: &CancellationToken,
    ) -> Option<RaceOutcome> {
        tracing::info!(
            exchange = self.profile.name(),
            symbol = %event.symbol,
            target = %event.target_instant,
            channel = %self.channel,
            "running release event"
        );

        let mut connection = StreamConnection::new(
            Arc::clone(&self.profile),
            Arc::clone(&self.transport),
            self.connection_config.clone(),
        );
        let filter = TickFilter::new(Arc::clone(&self.profile), self.channel);
        let window = CaptureWindow::new(self.capture_settings.clone(), Arc::clone(&self.sink));

        let Some(captured) = window
            .capture(&mut connection, &filter, event, cancel)
            .await
        else {
            tracing::warn!(
                symbol = %event.symbol,
                "no reference price captured; aborting event without placing orders"
            );
            return None;
        };

        let racer = OrderRacer::new(Arc::clone(&self.gateway), Arc::clone(&self.sizing));
        let results = racer
            .race(&event.symbol, captured.value, &self.race_spec)
            .await;

        let reconciler = Reconciler::new(Arc::clone(&self.gateway));
        let outcome = reconciler.reconcile(results, &self.counter_spec).await;

        self.sink.record_outcome(&outcome);
        tracing::info!(
            symbol = %event.symbol,
            won = outcome.winner.is_some(),
            compensations = outcome.compensating_actions.len(),
            fully_reconciled = outcome.fully_reconciled(),
            "release event complete"
        );
        Some(outcome)
    }
}
