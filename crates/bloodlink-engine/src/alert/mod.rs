//! Alert lifecycle.

pub mod service;

pub use service::AlertService;
