//! Application Ports
//!
//! Interfaces the core requires from its external collaborators: the
//! per-exchange strategy bundle, the raw transport, the order-placement
//! service, the sizing policy, and the optional telemetry sink.

pub mod exchange_profile;
pub mod market_transport;
pub mod order_gateway;
pub mod outcome_sink;
pub mod sizing;

pub use exchange_profile::{ExchangeProfile, FrameKind, KeepaliveFrame, ProfileError};
pub use market_transport::{
    MarketTransport, TransportError, TransportLink, TransportSink, TransportSource, WireFrame,
};
pub use order_gateway::{OrderAck, OrderError, OrderGateway};
pub use outcome_sink::{NoOpSink, OutcomeSink};
pub use sizing::{SizeAndPrecision, SizingPolicy, TieredSizing};
