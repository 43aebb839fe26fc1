//! Donor answers to an alert.

pub mod model;

pub use model::{DonorResponse, ResponseKind, ResponseSummary};
