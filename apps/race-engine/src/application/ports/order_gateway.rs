//! Order Gateway Port (Driven Port)
//!
//! Interface to the per-exchange order-placement service. Signing,
//! authentication, and wire formats are the collaborator's concern; the core
//! treats placement as an injected function and is agnostic to the
//! authentication scheme.

use async_trait::async_trait;

use crate::domain::OrderIntent;

/// Acknowledgement for an accepted order.
#[derive(Debug, Clone)]
pub struct OrderAck {
    /// Exchange-assigned order id.
    pub order_id: String,
}

/// Order submission errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderError {
    /// The exchange rejected the order.
    #[error("order rejected: {reason}")]
    Rejected {
        /// Rejection reason.
        reason: String,
    },

    /// The submission failed at the network level.
    #[error("order network failure: {message}")]
    Network {
        /// Error details.
        message: String,
    },

    /// The submission timed out.
    #[error("order submission timed out")]
    Timeout,
}

/// Port for order placement and cancellation.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Submit one priced order.
    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, OrderError>;

    /// Cancel a resting order.
    async fn cancel_order(&self, symbol: &str, order_id: &str) -> Result<(), OrderError>;
}
