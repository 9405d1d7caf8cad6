//! Race Engine Binary
//!
//! Runs one release event end to end: countdown, first-tick capture, order
//! race, reconciliation. Invoked once per event by the process supervisor;
//! single-instance locking is the supervisor's concern.
//!
//! # Usage
//!
//! ```bash
//! RACE_EXCHANGE=bitget \
//! RACE_SYMBOL=NEWUSDT \
//! RACE_TARGET_AT=2026-08-05T12:00:00Z \
//! cargo run --bin race-engine
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `RACE_EXCHANGE`: bitget | kucoin | gate
//! - `RACE_SYMBOL`: Symbol going live, in the exchange's own notation
//! - `RACE_TARGET_AT`: Release instant, RFC 3339
//!
//! ## Optional
//! - `RACE_CHANNEL`: ticker | trade | depth (default: ticker)
//! - `RACE_COUNT`, `RACE_SIDE`, `RACE_OFFSET_PCT`, `RACE_TIF`: Ladder shape
//! - `RACE_WINNER_RULE`: submission_order | lowest_latency
//! - `COUNTER_MARKUP_PCT`, `COUNTER_FEE_PCT`, `COUNTER_TIF`: Reconciliation
//! - `CAPTURE_NEAR_THRESHOLD_SECS`, `CAPTURE_MAX_WAIT_MS`: Window bounds
//! - `WS_*`: Heartbeat and reconnect tuning
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use race_engine::infrastructure::telemetry;
use race_engine::{
    DryRunGateway, NoOpSink, OutcomeSink, RacerConfig, ReleaseEvent, ReleaseRunner, TieredSizing,
    TracingSink, WsTransport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;

    // Load .env in dev; absence is fine.
    dotenvy::dotenv().ok();

    telemetry::init();

    let config = RacerConfig::from_env()?;
    log_config(&config);

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let sink: Arc<dyn OutcomeSink> = if std::env::var("TELEMETRY_DISABLED").is_ok() {
        Arc::new(NoOpSink)
    } else {
        Arc::new(TracingSink::new())
    };

    let runner = ReleaseRunner::new(
        config.exchange.profile(),
        Arc::new(WsTransport::new()),
        // Order signing lives in per-exchange collaborators; this binary
        // rehearses against live market data with local acknowledgements.
        Arc::new(DryRunGateway::new(config.dry_run_latency)),
        Arc::new(TieredSizing::default()),
        sink,
        config.websocket.connection_config(),
        config.capture.clone(),
        config.channel,
        config.race.clone(),
        config.counter.clone(),
    );

    let event = ReleaseEvent::new(
        config.event.symbol.clone(),
        config.event.target_at,
        config.event.discovered_from.clone(),
    );

    match runner.run(&event, &cancel).await {
        Some(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        None => {
            tracing::warn!("event aborted without orders");
            std::process::exit(1);
        }
    }
}

/// Cancel the run on ctrl-c so the capture window unwinds through cleanup.
fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            cancel.cancel();
        }
    });
}

/// Log the effective configuration, secrets excluded.
fn log_config(config: &RacerConfig) {
    tracing::info!(
        exchange = config.exchange.as_str(),
        symbol = %config.event.symbol,
        target = %config.event.target_at,
        channel = %config.channel,
        race_count = config.race.count,
        offset_pct = %config.race.price_offset_percent,
        max_wait_ms = config.capture.max_wait.as_millis(),
        "configuration loaded"
    );
}
