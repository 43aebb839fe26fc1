//! Recipient entity, urgency, and waiting status.

pub mod model;

pub use model::{Recipient, RecipientStatus, UrgencyLevel};
