//! Reconciler
//!
//! Picks the winning fill out of a race and closes out every other
//! successful leg with an offsetting order. Winner selection is
//! deterministic given the same results, independent of the order the
//! concurrent submissions happened to complete in.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::application::ports::OrderGateway;
use crate::domain::{CounterSpec, OrderIntent, OrderResult, OrderSide, RaceOutcome, WinnerRule};

/// Post-race reconciliation.
pub struct Reconciler {
    gateway: Arc<dyn OrderGateway>,
}

impl Reconciler {
    /// Create a reconciler over the same gateway the racer used.
    #[must_use]
    pub fn new(gateway: Arc<dyn OrderGateway>) -> Self {
        Self { gateway }
    }

    /// Reconcile one race.
    ///
    /// Returns only after every compensating action has completed, success
    /// or failure; no position is left unaccounted for at return. A failed
    /// compensation is recorded in the outcome, never dropped.
    pub async fn reconcile(&self, results: Vec<OrderResult>, counter: &CounterSpec) -> RaceOutcome {
        let winner_index = pick_winner(&results, counter.winner_rule);

        let compensating_actions = join_all(
            results
                .iter()
                .enumerate()
                .filter(|(i, r)| r.success && Some(*i) != winner_index)
                .map(|(_, r)| self.compensate(r, counter)),
        )
        .await;

        let mut winner = None;
        let mut losers = Vec::with_capacity(results.len().saturating_sub(1));
        for (i, result) in results.into_iter().enumerate() {
            if Some(i) == winner_index {
                winner = Some(result);
            } else {
                losers.push(result);
            }
        }

        if !compensating_actions.iter().all(|a| a.success) {
            tracing::warn!("one or more compensating actions failed; outcome records them");
        }

        RaceOutcome {
            winner,
            losers,
            compensating_actions,
        }
    }

    /// Offset one losing-but-filled leg: opposite side, marked-up price,
    /// fee-adjusted size, same gateway.
    async fn compensate(&self, filled: &OrderResult, counter: &CounterSpec) -> OrderResult {
        let intent = counter_intent(&filled.intent, counter);
        tracing::info!(
            symbol = %intent.symbol,
            side = %intent.side,
            price = %intent.price,
            size = %intent.size,
            "offsetting losing fill"
        );

        let started = Instant::now();
        match self.gateway.place_order(&intent).await {
            Ok(ack) => OrderResult::accepted(intent, ack.order_id, started.elapsed()),
            Err(e) => {
                let latency = started.elapsed();
                tracing::warn!(price = %intent.price, error = %e, "compensating order failed");
                OrderResult::failed(intent, latency, e.to_string())
            }
        }
    }
}

/// Winner: first success in submission order, or lowest client-observed
/// latency, per the configured rule. Ties always fall back to submission
/// order so the choice is reproducible.
fn pick_winner(results: &[OrderResult], rule: WinnerRule) -> Option<usize> {
    match rule {
        WinnerRule::SubmissionOrder => results.iter().position(|r| r.success),
        WinnerRule::LowestLatency => results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.success)
            .min_by_key(|(i, r)| (r.execution_latency, *i))
            .map(|(i, _)| i),
    }
}

/// Build the offsetting intent for a filled leg.
fn counter_intent(filled: &OrderIntent, counter: &CounterSpec) -> OrderIntent {
    let hundred = Decimal::from(100);
    let side = filled.side.opposite();
    // Offsetting sells close above the fill, offsetting buys below it.
    let markup = match side {
        OrderSide::Sell => counter.markup_percent,
        OrderSide::Buy => -counter.markup_percent,
    };
    let price = (filled.price * (Decimal::ONE + markup / hundred))
        .round_dp(filled.price.scale());
    // The fee was taken out of the filled amount; never offset more than
    // is actually held.
    let size = (filled.size * (Decimal::ONE - counter.fee_percent / hundred))
        .round_dp_with_strategy(filled.size.scale(), RoundingStrategy::ToZero);

    OrderIntent {
        symbol: filled.symbol.clone(),
        side,
        price,
        size,
        time_in_force: counter.time_in_force,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    use crate::application::ports::{OrderAck, OrderError};
    use crate::domain::TimeInForce;

    struct RecordingGateway {
        fail: bool,
        calls: Mutex<Vec<OrderIntent>>,
    }

    impl RecordingGateway {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OrderGateway for RecordingGateway {
        async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, OrderError> {
            self.calls.lock().push(intent.clone());
            if self.fail {
                Err(OrderError::Rejected {
                    reason: "insufficient balance".to_string(),
                })
            } else {
                Ok(OrderAck {
                    order_id: format!("comp-{}", self.calls.lock().len()),
                })
            }
        }

        async fn cancel_order(&self, _symbol: &str, _order_id: &str) -> Result<(), OrderError> {
            Ok(())
        }
    }

    fn leg(price: Decimal, success: bool, latency_ms: u64) -> OrderResult {
        let intent = OrderIntent {
            symbol: "NEWUSDT".to_string(),
            side: OrderSide::Buy,
            price,
            size: dec!(100),
            time_in_force: TimeInForce::Gtc,
        };
        if success {
            OrderResult::accepted(
                intent,
                format!("ord-{price}"),
                Duration::from_millis(latency_ms),
            )
        } else {
            OrderResult::failed(
                intent,
                Duration::from_millis(latency_ms),
                "rejected".to_string(),
            )
        }
    }

    fn counter() -> CounterSpec {
        CounterSpec {
            markup_percent: dec!(1),
            fee_percent: dec!(0.1),
            time_in_force: TimeInForce::Gtc,
            winner_rule: WinnerRule::SubmissionOrder,
        }
    }

    #[tokio::test]
    async fn single_success_wins_with_no_compensation() {
        let gateway = Arc::new(RecordingGateway::new(false));
        let reconciler = Reconciler::new(Arc::clone(&gateway) as Arc<dyn OrderGateway>);

        let results = vec![
            leg(dec!(0.475), false, 10),
            leg(dec!(0.45), true, 12),
            leg(dec!(0.425), false, 11),
        ];
        let outcome = reconciler.reconcile(results, &counter()).await;

        assert_eq!(outcome.winner.as_ref().unwrap().intent.price, dec!(0.45));
        assert_eq!(outcome.losers.len(), 2);
        assert!(outcome.compensating_actions.is_empty());
        assert!(gateway.calls.lock().is_empty());
    }

    #[tokio::test]
    async fn first_success_in_submission_order_wins() {
        let gateway = Arc::new(RecordingGateway::new(false));
        let reconciler = Reconciler::new(gateway);

        // Index 1 completed faster, but index 0 comes first in submission
        // order and the default rule ignores latency.
        let results = vec![leg(dec!(0.475), true, 30), leg(dec!(0.45), true, 5)];
        let outcome = reconciler.reconcile(results, &counter()).await;

        assert_eq!(outcome.winner.as_ref().unwrap().intent.price, dec!(0.475));
        assert_eq!(outcome.compensating_actions.len(), 1);
        assert_eq!(outcome.losers.len(), 1);
    }

    #[tokio::test]
    async fn lowest_latency_rule_prefers_fastest_fill() {
        let gateway = Arc::new(RecordingGateway::new(false));
        let reconciler = Reconciler::new(gateway);

        let spec = CounterSpec {
            winner_rule: WinnerRule::LowestLatency,
            ..counter()
        };
        let results = vec![leg(dec!(0.475), true, 30), leg(dec!(0.45), true, 5)];
        let outcome = reconciler.reconcile(results, &spec).await;

        assert_eq!(outcome.winner.as_ref().unwrap().intent.price, dec!(0.45));
    }

    #[tokio::test]
    async fn every_losing_fill_compensated_exactly_once() {
        let gateway = Arc::new(RecordingGateway::new(false));
        let reconciler = Reconciler::new(Arc::clone(&gateway) as Arc<dyn OrderGateway>);

        let results = vec![
            leg(dec!(0.475), true, 10),
            leg(dec!(0.45), true, 11),
            leg(dec!(0.425), false, 12),
            leg(dec!(0.4), true, 13),
        ];
        let outcome = reconciler.reconcile(results, &counter()).await;

        // Successes at 1 and 3 lose to the winner at 0; the failure at 2
        // needs nothing.
        assert_eq!(outcome.compensating_actions.len(), 2);
        assert!(outcome.compensating_actions.iter().all(|a| a.success));
        assert_eq!(gateway.calls.lock().len(), 2);
        assert_eq!(outcome.losers.len(), 3);
    }

    #[tokio::test]
    async fn counter_intent_flips_side_and_adjusts_price_and_size() {
        let filled = OrderIntent {
            symbol: "NEWUSDT".to_string(),
            side: OrderSide::Buy,
            price: dec!(0.4500),
            size: dec!(1000),
            time_in_force: TimeInForce::Ioc,
        };
        let intent = counter_intent(&filled, &counter());

        assert_eq!(intent.side, OrderSide::Sell);
        // 1% above the fill, at the fill's own precision.
        assert_eq!(intent.price, dec!(0.4545));
        // 0.1% fee trimmed, rounded toward zero.
        assert_eq!(intent.size, dec!(999));
        assert_eq!(intent.time_in_force, TimeInForce::Gtc);
    }

    #[tokio::test]
    async fn sell_race_compensates_with_discounted_buy() {
        let filled = OrderIntent {
            symbol: "NEWUSDT".to_string(),
            side: OrderSide::Sell,
            price: dec!(2.00),
            size: dec!(50),
            time_in_force: TimeInForce::Gtc,
        };
        let intent = counter_intent(&filled, &counter());

        assert_eq!(intent.side, OrderSide::Buy);
        assert_eq!(intent.price, dec!(1.98));
    }

    #[tokio::test]
    async fn failed_compensation_recorded_not_dropped() {
        let gateway = Arc::new(RecordingGateway::new(true));
        let reconciler = Reconciler::new(gateway);

        let results = vec![leg(dec!(0.475), true, 10), leg(dec!(0.45), true, 11)];
        let outcome = reconciler.reconcile(results, &counter()).await;

        assert_eq!(outcome.compensating_actions.len(), 1);
        assert!(!outcome.compensating_actions[0].success);
        assert!(!outcome.fully_reconciled());
    }

    #[tokio::test]
    async fn all_failures_yield_no_winner() {
        let gateway = Arc::new(RecordingGateway::new(false));
        let reconciler = Reconciler::new(Arc::clone(&gateway) as Arc<dyn OrderGateway>);

        let results = vec![leg(dec!(0.475), false, 10), leg(dec!(0.45), false, 11)];
        let outcome = reconciler.reconcile(results, &counter()).await;

        assert!(outcome.winner.is_none());
        assert_eq!(outcome.losers.len(), 2);
        assert!(outcome.compensating_actions.is_empty());
        assert!(gateway.calls.lock().is_empty());
    }
}
