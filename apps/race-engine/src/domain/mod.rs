//! Domain Layer
//!
//! Immutable value records for release events, market data observations,
//! and racing orders. No I/O lives here.

pub mod event;
pub mod market;
pub mod order;

pub use event::ReleaseEvent;
pub use market::{CapturedPrice, Channel, ConnectionState, RawMessage, Tick};
pub use order::{
    CounterSpec, OrderIntent, OrderResult, OrderSide, RaceOutcome, RaceSpec, TimeInForce,
    WinnerRule,
};
