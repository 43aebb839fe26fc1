//! Route handlers.

pub mod alert;
pub mod delivery;
pub mod health;
pub mod matching;
