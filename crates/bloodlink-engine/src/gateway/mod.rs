//! Notification gateway implementations.

pub mod logging;

pub use logging::LoggingGateway;
