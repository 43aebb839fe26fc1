//! # bloodlink-core
//!
//! Core crate for BloodLink. Contains the collaborator traits (record
//! store, notification gateway), configuration schemas, typed
//! identifiers, geographic coordinates, and the unified error system.
//!
//! This crate has **no** internal dependencies on other BloodLink crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
