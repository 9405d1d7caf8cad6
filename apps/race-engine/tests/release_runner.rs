//! Release Runner End-to-End Tests
//!
//! One full event over scripted collaborators: countdown, capture, race,
//! reconciliation, and the abort path when no reference price arrives.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

use race_engine::{
    CaptureSettings, Channel, ConnectionConfig, CounterSpec, NoOpSink, OrderGateway, OrderSide,
    OutcomeSink, RaceOutcome, RaceSpec, ReleaseEvent, ReleaseRunner, Tick, TimeInForce,
    WinnerRule,
};

use common::{price_frame, scripted_link, stub_profile, FixedSizing, QueueTransport, ScriptedGateway};

fn runner_with(
    links: Vec<race_engine::TransportLink>,
    gateway: Arc<ScriptedGateway>,
    sink: Arc<dyn OutcomeSink>,
) -> ReleaseRunner {
    ReleaseRunner::new(
        stub_profile(),
        Arc::new(QueueTransport::new(links)),
        gateway as Arc<dyn OrderGateway>,
        Arc::new(FixedSizing {
            size: dec!(100),
            price_decimals: 4,
        }),
        sink,
        ConnectionConfig::default(),
        CaptureSettings {
            near_threshold: Duration::from_millis(150),
            max_wait: Duration::from_millis(800),
        },
        Channel::Ticker,
        RaceSpec {
            count: 2,
            side: OrderSide::Buy,
            price_offset_percent: dec!(-5),
            time_in_force: TimeInForce::Gtc,
        },
        CounterSpec {
            markup_percent: dec!(1),
            fee_percent: dec!(0.1),
            time_in_force: TimeInForce::Gtc,
            winner_rule: WinnerRule::SubmissionOrder,
        },
    )
}

#[tokio::test]
async fn full_event_captures_races_and_reconciles() {
    let target = Utc::now() + TimeDelta::milliseconds(250);
    let event = ReleaseEvent::new("NEWUSDT", target, "test");

    let (link, tx) = scripted_link(true);
    tokio::spawn(async move {
        while Utc::now() < target + TimeDelta::milliseconds(20) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let _ = tx.send(price_frame("1.00"));
    });

    let gateway = Arc::new(ScriptedGateway::all_succeed());
    let runner = runner_with(vec![link], Arc::clone(&gateway), Arc::new(NoOpSink));

    let outcome = runner
        .run(&event, &CancellationToken::new())
        .await
        .expect("capture should succeed");

    // Ladder off the captured 1.00: 0.95 wins, 0.90 fills and is offset.
    assert_eq!(outcome.winner.as_ref().unwrap().intent.price, dec!(0.95));
    assert_eq!(outcome.losers.len(), 1);
    assert_eq!(outcome.compensating_actions.len(), 1);
    assert_eq!(
        outcome.compensating_actions[0].intent.side,
        OrderSide::Sell
    );
    assert!(outcome.fully_reconciled());

    // Two race legs plus one compensation reached the gateway.
    assert_eq!(gateway.calls().len(), 3);
}

#[tokio::test]
async fn failed_capture_places_no_orders() {
    let target = Utc::now() + TimeDelta::milliseconds(150);
    let event = ReleaseEvent::new("NEWUSDT", target, "test");

    // Stream stays silent; the window must elapse and abort the event.
    let (link, _tx) = scripted_link(true);
    let gateway = Arc::new(ScriptedGateway::all_succeed());
    let runner = runner_with(vec![link], Arc::clone(&gateway), Arc::new(NoOpSink));

    let outcome = runner.run(&event, &CancellationToken::new()).await;

    assert!(outcome.is_none());
    assert!(gateway.calls().is_empty(), "no order without a reference price");
}

#[tokio::test]
async fn outcome_reaches_the_sink() {
    #[derive(Default)]
    struct CapturingSink {
        outcomes: Mutex<Vec<RaceOutcome>>,
    }

    impl OutcomeSink for CapturingSink {
        fn record_tick(&self, _tick: &Tick) {}

        fn record_outcome(&self, outcome: &RaceOutcome) {
            self.outcomes.lock().push(outcome.clone());
        }
    }

    let target = Utc::now() + TimeDelta::milliseconds(200);
    let event = ReleaseEvent::new("NEWUSDT", target, "test");

    let (link, tx) = scripted_link(true);
    tokio::spawn(async move {
        while Utc::now() < target + TimeDelta::milliseconds(20) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        let _ = tx.send(price_frame("0.50"));
    });

    let sink = Arc::new(CapturingSink::default());
    let gateway = Arc::new(ScriptedGateway::all_succeed());
    let runner = runner_with(
        vec![link],
        gateway,
        Arc::clone(&sink) as Arc<dyn OutcomeSink>,
    );

    runner.run(&event, &CancellationToken::new()).await.unwrap();

    let outcomes = sink.outcomes.lock();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].winner.is_some());
}
