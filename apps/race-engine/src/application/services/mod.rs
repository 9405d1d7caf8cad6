//! Application Services
//!
//! Exchange-agnostic stream processing over the port definitions.

pub mod tick_filter;

pub use tick_filter::TickFilter;
