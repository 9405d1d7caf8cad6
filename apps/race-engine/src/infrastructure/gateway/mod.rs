//! Order Gateways
//!
//! Local implementations of the order-placement port. Production signing
//! and wire formats belong to per-exchange collaborators outside this crate.

pub mod dry_run;

pub use dry_run::DryRunGateway;
