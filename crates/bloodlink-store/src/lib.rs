//! # bloodlink-store
//!
//! Record store support for BloodLink:
//!
//! - **memory**: In-process store backed by [dashmap](https://crates.io/crates/dashmap)
//! - **keys**: the key layout shared by every entity
//! - **repositories**: typed JSON repositories over any [`RecordStore`]
//!
//! The provider is selected at runtime based on configuration.
//!
//! [`RecordStore`]: bloodlink_core::traits::RecordStore

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
pub mod repositories;

pub use provider::StoreManager;
pub use repositories::Versioned;
