//! Sizing Policy Port (Driven Port)
//!
//! Size-per-order and decimal rounding come from a price-tier table supplied
//! by the symbol metadata collaborator: smaller unit price, larger size, more
//! rounding precision. The core treats this as an injected policy function so
//! it can vary per exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sizing decision for one rung of the price ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeAndPrecision {
    /// Order size in base units.
    pub size: Decimal,
    /// Decimal places the order price is rounded to.
    pub price_decimals: u32,
}

/// Injected sizing policy. Read-only shared configuration, safe for
/// concurrent reads by all racing submissions.
pub trait SizingPolicy: Send + Sync {
    /// Size and price precision for an order at the given unit price.
    fn size_and_precision(&self, price: Decimal) -> SizeAndPrecision;

    /// Minimum order notional (price x size) the exchange accepts.
    fn min_notional(&self) -> Decimal;
}

/// Table-driven default policy.
///
/// Tiers are `(upper_price_bound, size, price_decimals)` rows sorted by
/// ascending bound; the first row whose bound exceeds the price wins, and
/// prices above every bound fall through to the last row.
#[derive(Debug, Clone)]
pub struct TieredSizing {
    tiers: Vec<(Decimal, SizeAndPrecision)>,
    min_notional: Decimal,
}

impl TieredSizing {
    /// Build a policy from explicit tiers.
    ///
    /// Returns `None` when `tiers` is empty.
    #[must_use]
    pub fn new(tiers: Vec<(Decimal, SizeAndPrecision)>, min_notional: Decimal) -> Option<Self> {
        if tiers.is_empty() {
            return None;
        }
        let mut tiers = tiers;
        tiers.sort_by(|a, b| a.0.cmp(&b.0));
        Some(Self {
            tiers,
            min_notional,
        })
    }
}

impl Default for TieredSizing {
    fn default() -> Self {
        let row = |bound: (i64, u32), size: i64, decimals: u32| {
            (
                Decimal::new(bound.0, bound.1),
                SizeAndPrecision {
                    size: Decimal::from(size),
                    price_decimals: decimals,
                },
            )
        };
        Self {
            tiers: vec![
                row((1, 2), 20_000, 6),  // below 0.01
                row((1, 1), 4_000, 5),   // below 0.1
                row((1, 0), 600, 4),     // below 1
                row((10, 0), 80, 3),     // below 10
                row((100, 0), 10, 2),    // below 100
                row((1_000, 0), 1, 2),   // everything else
            ],
            min_notional: Decimal::from(5),
        }
    }
}

impl SizingPolicy for TieredSizing {
    fn size_and_precision(&self, price: Decimal) -> SizeAndPrecision {
        for (bound, decision) in &self.tiers {
            if price < *bound {
                return *decision;
            }
        }
        // Fell through every bound: reuse the coarsest tier.
        self.tiers[self.tiers.len() - 1].1
    }

    fn min_notional(&self) -> Decimal {
        self.min_notional
    }
}
