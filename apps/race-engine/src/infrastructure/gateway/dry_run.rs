//! Dry-Run Gateway
//!
//! Acknowledges every order locally with a synthetic id and a configurable
//! artificial latency. Used for rehearsal runs against live market data and
//! by tests; no order ever reaches an exchange.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::{OrderAck, OrderError, OrderGateway};
use crate::domain::OrderIntent;

/// Gateway that fills everything locally.
#[derive(Debug, Clone)]
pub struct DryRunGateway {
    latency: Duration,
}

impl Default for DryRunGateway {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(30),
        }
    }
}

impl DryRunGateway {
    /// Create a gateway with the given artificial latency per call.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl OrderGateway for DryRunGateway {
    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, OrderError> {
        tokio::time::sleep(self.latency).await;
        let order_id = format!("dry-{}", Uuid::new_v4());
        tracing::info!(
            symbol = %intent.symbol,
            side = %intent.side,
            price = %intent.price,
            size = %intent.size,
            %order_id,
            "dry-run order acknowledged"
        );
        Ok(OrderAck { order_id })
    }

    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<(), OrderError> {
        tokio::time::sleep(self.latency).await;
        tracing::info!(%symbol, %order_id, "dry-run order cancelled");
        Ok(())
    }
}
