//! RACING-ODDS: live WIN odds aggregator
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod normalize;
pub mod providers;
pub mod store;
pub mod engine;
pub mod coverage;
pub mod api;
