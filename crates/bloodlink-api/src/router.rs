//! Route definitions for the BloodLink HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(matching_routes())
        .merge(alert_routes())
        .merge(delivery_routes())
        .merge(health_routes());

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Donor matching for recipients
fn matching_routes() -> Router<AppState> {
    Router::new().route(
        "/recipients/{id}/matches",
        post(handlers::matching::find_matches).get(handlers::matching::recorded_matches),
    )
}

/// Alert lifecycle and dispatch
fn alert_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/alerts",
            post(handlers::alert::create_alert).get(handlers::alert::list_alerts),
        )
        .route("/alerts/{id}", get(handlers::alert::get_alert))
        .route("/alerts/{id}/activate", post(handlers::alert::activate_alert))
        .route("/alerts/{id}/cancel", post(handlers::alert::cancel_alert))
        .route("/alerts/{id}/dispatch", post(handlers::alert::dispatch_alert))
        .route(
            "/audience/estimate",
            post(handlers::alert::estimate_audience),
        )
}

/// Delivery status, gateway callbacks and donor responses
fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/alerts/{id}/deliveries",
            get(handlers::delivery::delivery_status),
        )
        .route("/alerts/{id}/summary", get(handlers::delivery::delivery_summary))
        .route(
            "/deliveries/callback",
            post(handlers::delivery::delivery_callback),
        )
        .route(
            "/alerts/{id}/responses",
            post(handlers::delivery::record_response),
        )
}

/// Health check
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
