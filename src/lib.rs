//! Pricing endpoint for the concrete flooring cost calculator
//!
//! Fetches the published pricing sheet, compiles it into per-category tier
//! prices and ranges, overlays surcharge settings and serves the result as
//! JSON behind a short-lived cache.

pub mod cli;
pub mod config;
pub mod server;
pub mod services;
pub mod types;
