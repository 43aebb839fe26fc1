//! Hospital entity.

pub mod model;

pub use model::Hospital;
