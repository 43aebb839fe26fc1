//! `CallerHospital` extractor reading the calling hospital from a header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use bloodlink_core::error::AppError;
use bloodlink_core::types::HospitalId;
use bloodlink_engine::RequestContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Header naming the hospital on whose behalf a request is made.
///
/// Authentication happens upstream; this service trusts the header.
pub const HOSPITAL_HEADER: &str = "x-hospital-id";

/// Calling hospital context available in handlers.
#[derive(Debug, Clone)]
pub struct CallerHospital(pub RequestContext);

impl CallerHospital {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for CallerHospital {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for CallerHospital {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(HOSPITAL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::authorization("Missing X-Hospital-Id header"))?;

        let hospital_id = HospitalId::parse(raw)?;
        Ok(CallerHospital(RequestContext::new(hospital_id)))
    }
}
