//! Application Layer
//!
//! Port definitions for injected collaborators and the use cases that
//! orchestrate one capture-and-race run.

pub mod ports;
pub mod services;
pub mod use_cases;
