//! Custom request extractors.

pub mod hospital;
pub mod path;

pub use hospital::{CallerHospital, HOSPITAL_HEADER};
pub use path::parse_uuid;
