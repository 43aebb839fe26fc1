//! Per-donor, per-channel alert delivery records.

pub mod model;
pub mod state;

pub use bloodlink_core::types::DeliveryChannel;
pub use model::{AlertDelivery, DeliverySummary};
pub use state::DeliveryState;
