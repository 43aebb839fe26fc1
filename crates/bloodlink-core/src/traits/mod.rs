//! Collaborator traits defined in `bloodlink-core` and implemented by other crates.

pub mod gateway;
pub mod store;

pub use gateway::{AlertPayload, GatewayResponse, NotificationGateway, RejectionKind};
pub use store::RecordStore;
