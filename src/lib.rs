//! PageSync host library
//!
//! Configuration loading, tracing setup and dependency wiring for the
//! headless page editor host.

pub mod bootstrap;

pub use bootstrap::{load_config, run_app, wire_dependencies};
