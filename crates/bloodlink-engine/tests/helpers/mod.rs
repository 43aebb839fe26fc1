//! Shared helpers for engine integration tests.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use bloodlink_core::config::{DispatchConfig, MatchingConfig};
use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::traits::gateway::{
    AlertPayload, GatewayResponse, NotificationGateway, RejectionKind,
};
use bloodlink_core::traits::store::RecordStore;
use bloodlink_core::types::{DeliveryChannel, DonorId, GeoPoint, HospitalId, RecipientId};
use bloodlink_entity::alert::{Alert, AlertDefinition};
use bloodlink_entity::blood::BloodGroup;
use bloodlink_entity::donor::{Donor, DonorContact, VerificationStatus};
use bloodlink_entity::hospital::Hospital;
use bloodlink_entity::recipient::{Recipient, RecipientStatus, UrgencyLevel};
use bloodlink_engine::{AlertDispatcher, AlertService, MatchService, RequestContext};
use bloodlink_store::memory::MemoryRecordStore;
use bloodlink_store::repositories::{
    AlertRepository, DonorRepository, HospitalRepository, MatchRepository, RecipientRepository,
};

/// Colombo General.
pub const HOSPITAL_LAT: f64 = 6.9271;
pub const HOSPITAL_LON: f64 = 79.8612;

/// How the scripted gateway answers.
#[derive(Debug, Clone)]
pub enum GatewayMode {
    Accept,
    RejectTransient,
    RejectPermanent,
    Error,
    /// Sleep, then accept.
    Slow(Duration),
    /// Wait for a permit on the gate, then accept.
    Hold(Arc<Semaphore>),
}

/// One call the gateway received.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub channel: DeliveryChannel,
    pub contact: String,
    pub payload: AlertPayload,
}

/// Gateway double that records every call.
#[derive(Debug)]
pub struct ScriptedGateway {
    mode: GatewayMode,
    calls: Mutex<Vec<SentMessage>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<SentMessage> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Highest number of calls observed in progress at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationGateway for ScriptedGateway {
    async fn send(
        &self,
        channel: DeliveryChannel,
        contact: &str,
        payload: &AlertPayload,
    ) -> AppResult<GatewayResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(SentMessage {
            channel,
            contact: contact.to_string(),
            payload: payload.clone(),
        });

        let response = match &self.mode {
            GatewayMode::Accept => Ok(GatewayResponse::Accepted),
            GatewayMode::RejectTransient => Ok(GatewayResponse::Rejected {
                kind: RejectionKind::Transient,
                reason: "rate limited".to_string(),
            }),
            GatewayMode::RejectPermanent => Ok(GatewayResponse::Rejected {
                kind: RejectionKind::Permanent,
                reason: "invalid number".to_string(),
            }),
            GatewayMode::Error => Err(AppError::external_service("connection reset")),
            GatewayMode::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(GatewayResponse::Accepted)
            }
            GatewayMode::Hold(gate) => {
                let _permit = gate.acquire().await;
                Ok(GatewayResponse::Accepted)
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

/// Dispatch settings with immediate retries.
pub fn dispatch_config() -> DispatchConfig {
    DispatchConfig {
        gateway_timeout_ms: 1_000,
        max_attempts: 3,
        base_backoff_ms: 0,
        ..DispatchConfig::default()
    }
}

/// Engine services over a fresh in-memory store.
pub struct TestEngine {
    pub store: Arc<dyn RecordStore>,
    pub hospital: Hospital,
    pub ctx: RequestContext,
    pub alerts: AlertService,
    pub matches: MatchService,
    pub dispatcher: AlertDispatcher,
    pub gateway: Arc<ScriptedGateway>,
    pub donors: DonorRepository,
    pub recipients: RecipientRepository,
    pub alert_repo: AlertRepository,
}

impl TestEngine {
    pub async fn new(mode: GatewayMode) -> Self {
        Self::with_config(mode, dispatch_config()).await
    }

    pub async fn with_config(mode: GatewayMode, dispatch: DispatchConfig) -> Self {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        let matching = MatchingConfig::default();

        let hospitals = HospitalRepository::new(Arc::clone(&store));
        let hospital = Hospital {
            id: HospitalId::new(),
            name: "Colombo General".to_string(),
            location: GeoPoint::new(HOSPITAL_LAT, HOSPITAL_LON).unwrap(),
            created_at: Utc::now(),
        };
        hospitals.save(&hospital).await.unwrap();

        let donors = DonorRepository::new(Arc::clone(&store));
        let recipients = RecipientRepository::new(Arc::clone(&store));
        let alert_repo = AlertRepository::new(Arc::clone(&store));

        let gateway = Arc::new(ScriptedGateway::new(mode));
        let dispatcher = AlertDispatcher::new(
            Arc::clone(&store),
            gateway.clone(),
            dispatch,
            &matching,
        );

        Self {
            alerts: AlertService::new(alert_repo.clone(), recipients.clone(), hospitals),
            matches: MatchService::new(
                donors.clone(),
                recipients.clone(),
                MatchRepository::new(Arc::clone(&store)),
                matching,
            ),
            ctx: RequestContext::new(hospital.id),
            store,
            hospital,
            dispatcher,
            gateway,
            donors,
            recipients,
            alert_repo,
        }
    }

    /// An active, verified donor reachable on every channel.
    pub async fn add_donor(&self, group: BloodGroup, lat: f64, lon: f64) -> Donor {
        let now = Utc::now();
        let id = DonorId::new();
        let donor = Donor {
            id,
            hospital_id: self.hospital.id,
            name: format!("Donor {group}"),
            blood_group: group,
            location: GeoPoint::new(lat, lon).unwrap(),
            is_active: true,
            last_donation_date: None,
            verification_status: VerificationStatus::Verified,
            contact: DonorContact {
                phone: Some("+94770000000".to_string()),
                email: Some(format!("{id}@donors.test")),
                push_token: Some(format!("push-{id}")),
            },
            created_at: now,
            updated_at: now,
        };
        self.donors.save(&donor).await.unwrap();
        donor
    }

    /// A donor close to the hospital.
    pub async fn add_nearby_donor(&self, group: BloodGroup) -> Donor {
        self.add_donor(group, HOSPITAL_LAT + 0.01, HOSPITAL_LON + 0.01)
            .await
    }

    pub async fn save_donor(&self, donor: &Donor) {
        self.donors.save(donor).await.unwrap();
    }

    pub async fn add_recipient(&self, group: BloodGroup) -> Recipient {
        let recipient = Recipient {
            id: RecipientId::new(),
            hospital_id: self.hospital.id,
            name: "Ward 7 patient".to_string(),
            blood_group: group,
            location: self.hospital.location,
            urgency_level: UrgencyLevel::Critical,
            status: RecipientStatus::Waiting,
            created_at: Utc::now(),
        };
        self.recipients.save(&recipient).await.unwrap();
        recipient
    }

    pub fn definition(&self, targets: &[BloodGroup]) -> AlertDefinition {
        AlertDefinition {
            recipient_id: None,
            title: "Blood needed".to_string(),
            message: "Please visit Colombo General blood bank".to_string(),
            urgency_level: UrgencyLevel::Critical,
            target_blood_groups: targets.iter().copied().collect::<BTreeSet<_>>(),
            max_distance_km: 25.0,
            expires_at: Utc::now() + chrono::Duration::hours(6),
            draft: false,
        }
    }

    /// An active alert centred on the hospital.
    pub async fn create_alert(&self, targets: &[BloodGroup]) -> Alert {
        self.alerts
            .create_alert(&self.ctx, self.definition(targets))
            .await
            .unwrap()
    }
}
