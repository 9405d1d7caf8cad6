//! Infrastructure Layer
//!
//! Adapters and external integrations: the countdown clock, the WebSocket
//! stream connection, per-exchange profiles, configuration, the dry-run
//! order gateway, and telemetry.

pub mod clock;
pub mod config;
pub mod exchanges;
pub mod gateway;
pub mod stream;
pub mod telemetry;
