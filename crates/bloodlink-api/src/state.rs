//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use bloodlink_core::config::AppConfig;
use bloodlink_core::traits::gateway::NotificationGateway;
use bloodlink_core::traits::store::RecordStore;
use bloodlink_engine::{AlertDispatcher, AlertService, MatchService};
use bloodlink_store::repositories::{
    AlertRepository, DonorRepository, HospitalRepository, MatchRepository, RecipientRepository,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Record store backing every repository
    pub store: Arc<dyn RecordStore>,
    /// Donor matching
    pub match_service: Arc<MatchService>,
    /// Alert lifecycle
    pub alert_service: Arc<AlertService>,
    /// Alert fan-out and delivery tracking
    pub dispatcher: Arc<AlertDispatcher>,
    /// When the process started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire repositories and services over a store and a gateway.
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn RecordStore>,
        gateway: Arc<dyn NotificationGateway>,
    ) -> Self {
        let donors = DonorRepository::new(Arc::clone(&store));
        let recipients = RecipientRepository::new(Arc::clone(&store));
        let hospitals = HospitalRepository::new(Arc::clone(&store));
        let alerts = AlertRepository::new(Arc::clone(&store));
        let matches = MatchRepository::new(Arc::clone(&store));

        let match_service = MatchService::new(
            donors,
            recipients.clone(),
            matches,
            config.matching.clone(),
        );
        let alert_service = AlertService::new(alerts, recipients, hospitals);
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&store),
            gateway,
            config.dispatch.clone(),
            &config.matching,
        );

        Self {
            config,
            store,
            match_service: Arc::new(match_service),
            alert_service: Arc::new(alert_service),
            dispatcher: Arc::new(dispatcher),
            started_at: Utc::now(),
        }
    }
}
