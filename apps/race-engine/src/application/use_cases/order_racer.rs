//! Order Racer
//!
//! Computes the price ladder from the captured reference and fires every
//! leg concurrently. Submission order must not bias the outcome, each leg
//! measures its own completion latency, and a failed leg never aborts the
//! siblings still in flight.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use rust_decimal::Decimal;

use crate::application::ports::{OrderGateway, SizingPolicy};
use crate::domain::{OrderIntent, OrderResult, RaceSpec};

/// Concurrent fan-out of one race's orders.
pub struct OrderRacer {
    gateway: Arc<dyn OrderGateway>,
    sizing: Arc<dyn SizingPolicy>,
}

impl OrderRacer {
    /// Create a racer over the injected gateway and sizing policy.
    #[must_use]
    pub fn new(gateway: Arc<dyn OrderGateway>, sizing: Arc<dyn SizingPolicy>) -> Self {
        Self { gateway, sizing }
    }

    /// Race `spec.count` orders against the reference price.
    ///
    /// The result list always has exactly `spec.count` entries, in
    /// submission (ladder) order, regardless of how many legs fail.
    pub async fn race(
        &self,
        symbol: &str,
        reference: Decimal,
        spec: &RaceSpec,
    ) -> Vec<OrderResult> {
        let intents: Vec<OrderIntent> = spec
            .ladder(reference)
            .into_iter()
            .map(|rung| {
                let sizing = self.sizing.size_and_precision(rung);
                OrderIntent {
                    symbol: symbol.to_string(),
                    side: spec.side,
                    price: rung.round_dp(sizing.price_decimals),
                    size: sizing.size,
                    time_in_force: spec.time_in_force,
                }
            })
            .collect();

        tracing::info!(
            %symbol,
            count = intents.len(),
            %reference,
            offset_pct = %spec.price_offset_percent,
            "racing order ladder"
        );

        join_all(intents.into_iter().map(|intent| self.submit(intent))).await
    }

    /// Submit one leg, folding every fault into its result.
    async fn submit(&self, intent: OrderIntent) -> OrderResult {
        let notional = intent.price * intent.size;
        if notional < self.sizing.min_notional() {
            // The exchange would reject it anyway; keep the slot in the
            // result list without burning a round trip.
            return OrderResult::failed(
                intent,
                std::time::Duration::ZERO,
                format!("notional {notional} below exchange minimum"),
            );
        }

        let started = Instant::now();
        match self.gateway.place_order(&intent).await {
            Ok(ack) => OrderResult::accepted(intent, ack.order_id, started.elapsed()),
            Err(e) => {
                let latency = started.elapsed();
                tracing::warn!(price = %intent.price, error = %e, "race leg failed");
                OrderResult::failed(intent, latency, e.to_string())
            }
        }
    }
}
