//! Background sweeps for BloodLink.
//!
//! This crate provides a runner that periodically:
//! - Expires active alerts whose expiry time has passed
//! - Re-issues sends for failed deliveries whose backoff has elapsed
//!
//! and drains in-flight sends when asked to stop.

pub mod runner;

pub use runner::{RetryRunner, SweepReport};
