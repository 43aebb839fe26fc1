//! Donor entity and verification status.

pub mod model;

pub use model::{Donor, DonorContact, VerificationStatus};
