//! Racing Orders
//!
//! Order intents, per-leg results, the race ladder specification, and the
//! terminal outcome record of one full race.

use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Parse a side name, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sell" => Self::Sell,
            _ => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Time in force for a priced order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good until cancelled.
    #[default]
    Gtc,
    /// Immediate or cancel.
    Ioc,
    /// Fill or kill.
    Fok,
}

impl TimeInForce {
    /// Parse a time-in-force name, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "ioc" => Self::Ioc,
            "fok" => Self::Fok,
            _ => Self::Gtc,
        }
    }
}

/// One priced order to submit, constructed from the captured reference price
/// and the race specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Symbol to trade.
    pub symbol: String,
    /// Order side.
    pub side: OrderSide,
    /// Limit price.
    pub price: Decimal,
    /// Order size in base units.
    pub size: Decimal,
    /// Time in force.
    pub time_in_force: TimeInForce,
}

/// The result of one submission attempt. Exactly one result exists per
/// intent, success or failure.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResult {
    /// The intent this result belongs to.
    pub intent: OrderIntent,
    /// Whether the exchange accepted the order.
    pub success: bool,
    /// Exchange-assigned order id, when accepted.
    pub order_id: Option<String>,
    /// Send-to-completion latency of the submission, client-observed.
    pub execution_latency: Duration,
    /// Failure detail, when rejected or errored.
    pub failure_reason: Option<String>,
}

impl OrderResult {
    /// A successful submission.
    #[must_use]
    pub const fn accepted(
        intent: OrderIntent,
        order_id: String,
        execution_latency: Duration,
    ) -> Self {
        Self {
            intent,
            success: true,
            order_id: Some(order_id),
            execution_latency,
            failure_reason: None,
        }
    }

    /// A failed submission. Failures never abort sibling submissions.
    #[must_use]
    pub const fn failed(
        intent: OrderIntent,
        execution_latency: Duration,
        failure_reason: String,
    ) -> Self {
        Self {
            intent,
            success: false,
            order_id: None,
            execution_latency,
            failure_reason: Some(failure_reason),
        }
    }
}

/// Signal used to pick the winning fill among successful race legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerRule {
    /// First successful result in submission order; client-observed latency
    /// breaks ties.
    #[default]
    SubmissionOrder,
    /// Lowest client-observed execution latency among successes; submission
    /// order breaks ties.
    LowestLatency,
}

impl WinnerRule {
    /// Parse a winner rule, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "lowest_latency" => Self::LowestLatency,
            _ => Self::SubmissionOrder,
        }
    }
}

/// Specification for one race: how many legs, which side, and how the price
/// ladder steps away from the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSpec {
    /// Number of racing legs.
    pub count: usize,
    /// Side of every leg.
    pub side: OrderSide,
    /// Ladder step in percent of the reference price. Positive offsets step
    /// above the reference, negative below.
    pub price_offset_percent: Decimal,
    /// Time in force for every leg.
    pub time_in_force: TimeInForce,
}

impl RaceSpec {
    /// Compute the unrounded price ladder from a reference price.
    ///
    /// Rung `i` is priced at `reference * (1 + (i + 1) * offset / 100)`, a
    /// deliberately monotonic ladder: when the market moves against the
    /// racer, later-indexed legs are successively more aggressive.
    #[must_use]
    pub fn ladder(&self, reference: Decimal) -> Vec<Decimal> {
        let hundred = Decimal::from(100);
        (0..self.count)
            .map(|i| {
                let steps = Decimal::from(i + 1);
                reference * (Decimal::ONE + steps * self.price_offset_percent / hundred)
            })
            .collect()
    }
}

/// How a losing-but-filled leg is closed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSpec {
    /// Markup in percent applied to the filled price of the offsetting order.
    pub markup_percent: Decimal,
    /// Fee rate in percent deducted from the filled size before offsetting.
    pub fee_percent: Decimal,
    /// Time in force for offsetting orders.
    pub time_in_force: TimeInForce,
    /// Winner-selection signal.
    pub winner_rule: WinnerRule,
}

impl Default for CounterSpec {
    fn default() -> Self {
        Self {
            markup_percent: Decimal::ONE,
            fee_percent: Decimal::new(1, 1),
            time_in_force: TimeInForce::Gtc,
            winner_rule: WinnerRule::SubmissionOrder,
        }
    }
}

/// Terminal record of one full race, handed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RaceOutcome {
    /// The chosen winning fill, when any leg succeeded.
    pub winner: Option<OrderResult>,
    /// Every non-winning result, in submission order.
    pub losers: Vec<OrderResult>,
    /// One compensating result per successful non-winning leg.
    pub compensating_actions: Vec<OrderResult>,
}

impl RaceOutcome {
    /// Whether every compensating action completed successfully.
    #[must_use]
    pub fn fully_reconciled(&self) -> bool {
        self.compensating_actions.iter().all(|a| a.success)
    }
}
