//! ABO/Rh blood groups.

pub mod group;

pub use group::BloodGroup;
