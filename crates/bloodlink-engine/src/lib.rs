//! Donor matching and alert dispatch engine for BloodLink.
//!
//! This crate provides:
//! - The ABO/Rh compatibility resolver and great-circle distance estimator
//! - Deterministic donor ranking for a recipient
//! - Alert audience selection and the alert lifecycle
//! - Idempotent per-donor, per-channel delivery tracking
//! - Concurrent fan-out through a notification gateway with retry/backoff

pub mod alert;
pub mod audience;
pub mod compatibility;
pub mod context;
pub mod delivery;
pub mod dispatch;
pub mod distance;
pub mod gateway;
pub mod matching;

pub use alert::AlertService;
pub use context::RequestContext;
pub use delivery::DeliveryTracker;
pub use dispatch::{AlertDispatcher, DeliveryOutcome, DispatchResult};
pub use gateway::LoggingGateway;
pub use matching::MatchService;
