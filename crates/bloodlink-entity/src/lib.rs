//! # bloodlink-entity
//!
//! Domain entity models for BloodLink. Every struct in this crate
//! represents a stored record or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, and `Deserialize`; the serde
//! form is the single on-store representation.

pub mod alert;
pub mod blood;
pub mod delivery;
pub mod donor;
pub mod hospital;
pub mod matching;
pub mod recipient;
pub mod response;
