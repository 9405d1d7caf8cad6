#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_possible_wrap,
        clippy::too_many_lines,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Race Engine - Release-Synchronized Capture and Race
//!
//! Reacts to a scheduled market event (a new trading pair going live at a
//! known future instant) by connecting to a realtime market-data feed just
//! before the event, capturing the very first authoritative price tick after
//! the event fires, racing multiple priced orders against that tick, and
//! reconciling which of the racing orders actually filled.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Immutable value records
//!   - `event`: Release events
//!   - `market`: Channels, ticks, captured prices, connection state
//!   - `order`: Intents, results, race/counter specifications, outcomes
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Exchange profile, transport, order gateway, sizing, sinks
//!   - `services`: Tick filtering
//!   - `use_cases`: Capture window, order racer, reconciler, release runner
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `clock`: Coarse countdown plus short-sleep spin
//!   - `stream`: WebSocket connection, heartbeat, reconnect, codec
//!   - `exchanges`: Bitget, KuCoin, and Gate.io profiles
//!   - `gateway`: Dry-run order gateway
//!   - `config`: Environment configuration
//!   - `telemetry`: Tracing setup and outcome sinks
//!
//! # Data Flow
//!
//! ```text
//! Scheduler ──► CaptureWindow ──► OrderRacer ──► Reconciler ──► RaceOutcome
//!                    │
//!            StreamConnection ──► TickFilter
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Immutable value records with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::{
    CapturedPrice, Channel, ConnectionState, CounterSpec, OrderIntent, OrderResult, OrderSide,
    RaceOutcome, RaceSpec, RawMessage, ReleaseEvent, Tick, TimeInForce, WinnerRule,
};

// Ports
pub use application::ports::{
    ExchangeProfile, FrameKind, KeepaliveFrame, MarketTransport, NoOpSink, OrderAck, OrderError,
    OrderGateway, OutcomeSink, ProfileError, SizeAndPrecision, SizingPolicy, TieredSizing,
    TransportError, TransportLink, TransportSink, TransportSource, WireFrame,
};

// Services and use cases
pub use application::services::TickFilter;
pub use application::use_cases::{CaptureWindow, OrderRacer, Reconciler, ReleaseRunner};

// Infrastructure
pub use infrastructure::clock::Scheduler;
pub use infrastructure::config::{
    CaptureSettings, ConfigError, EventSettings, RacerConfig, WebSocketSettings,
};
pub use infrastructure::exchanges::{BitgetProfile, ExchangeId, GateProfile, KucoinProfile};
pub use infrastructure::gateway::DryRunGateway;
pub use infrastructure::stream::{
    ConnectionConfig, ConnectionError, StreamConnection, SubscriptionSpec, WsTransport,
};
pub use infrastructure::telemetry::TracingSink;
