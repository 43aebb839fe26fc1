//! Alert entity, definition, and lifecycle state.

pub mod model;
pub mod state;

pub use model::{Alert, AlertDefinition, AudienceCriteria, DEFAULT_REACH_RADIUS_KM};
pub use state::AlertState;
