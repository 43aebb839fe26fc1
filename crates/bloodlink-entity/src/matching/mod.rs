//! Computed donor/recipient matches.

pub mod model;

pub use model::{Match, MatchQuality};
