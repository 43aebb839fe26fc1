//! Per-donor, per-channel delivery records.

pub mod tracker;

pub use tracker::{Claim, DeliveryKey, DeliveryTracker};
