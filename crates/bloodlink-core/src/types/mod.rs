//! Core type definitions used across the BloodLink workspace.

pub mod channel;
pub mod geo;
pub mod id;

pub use channel::DeliveryChannel;
pub use geo::GeoPoint;
pub use id::*;
