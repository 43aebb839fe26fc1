//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use bloodlink_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Handler error wrapping [`AppError`] so it can be turned into a response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code and machine-readable code for an error kind.
    pub fn status(kind: ErrorKind) -> (StatusCode, &'static str) {
        match kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::AlertNotActive => (StatusCode::CONFLICT, "ALERT_NOT_ACTIVE"),
            ErrorKind::AlertExpired => (StatusCode::GONE, "ALERT_EXPIRED"),
            ErrorKind::ExternalService => (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR"),
            ErrorKind::Store
            | ErrorKind::Serialization
            | ErrorKind::Configuration
            | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = Self::status(err.kind);

        if err.is_rejection() {
            tracing::debug!(kind = %err.kind, error = %err.message, "Request rejected");
        } else {
            tracing::error!(kind = %err.kind, error = %err.message, "Request failed");
        }

        // Internal details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Internal server error".to_string()
        } else {
            err.message
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_exactly_the_client_errors() {
        use ErrorKind::*;
        let kinds = [
            Validation,
            NotFound,
            Authorization,
            AlertNotActive,
            AlertExpired,
            Conflict,
            Store,
            Serialization,
            Configuration,
            ExternalService,
            Internal,
        ];
        for kind in kinds {
            let rejected = AppError::new(kind, "x").is_rejection();
            assert_eq!(
                ApiError::status(kind).0.is_client_error(),
                rejected,
                "{kind}"
            );
        }
    }

    #[test]
    fn test_state_errors_map_to_client_statuses() {
        assert_eq!(ApiError::status(ErrorKind::AlertExpired).0, StatusCode::GONE);
        assert_eq!(ApiError::status(ErrorKind::AlertNotActive).0, StatusCode::CONFLICT);
        assert_eq!(ApiError::status(ErrorKind::Authorization).0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_store_error_is_hidden() {
        let response = ApiError(AppError::store("disk on fire")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
