//! # bloodlink-api
//!
//! HTTP API layer for BloodLink built on Axum.
//!
//! Provides the REST endpoints for matching, alerts, dispatch and the
//! gateway delivery callback, plus middleware (CORS, logging), the caller
//! hospital extractor, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
