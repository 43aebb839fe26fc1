//! Integration tests for reach previews and donor responses.

mod helpers;

use bloodlink_core::error::ErrorKind;
use bloodlink_core::types::{DeliveryChannel, DonorId, HospitalId};
use bloodlink_engine::{DeliveryOutcome, RequestContext};
use bloodlink_entity::alert::AudienceCriteria;
use bloodlink_entity::blood::BloodGroup;
use bloodlink_entity::response::ResponseKind;
use helpers::{GatewayMode, HOSPITAL_LAT, HOSPITAL_LON, TestEngine};

fn criteria(targets: &[BloodGroup], radius: f64) -> AudienceCriteria {
    AudienceCriteria {
        recipient_id: None,
        target_blood_groups: targets.iter().copied().collect(),
        max_distance_km: radius,
    }
}

#[tokio::test]
async fn test_estimate_matches_dispatch() {
    let engine = TestEngine::new(GatewayMode::Accept).await;
    engine.add_nearby_donor(BloodGroup::ONeg).await;
    engine.add_nearby_donor(BloodGroup::ONeg).await;
    engine
        .add_donor(BloodGroup::OPos, HOSPITAL_LAT + 0.36, HOSPITAL_LON)
        .await;
    engine.add_nearby_donor(BloodGroup::BPos).await;
    engine.add_donor(BloodGroup::ONeg, 7.2906, 80.6337).await;

    let targets = [BloodGroup::ONeg, BloodGroup::OPos];
    let estimate = engine
        .dispatcher
        .estimate_audience(&engine.ctx, &criteria(&targets, 50.0))
        .await
        .unwrap();
    assert_eq!(estimate.audience_size, 3);
    assert_eq!(estimate.by_blood_group.get(&BloodGroup::ONeg), Some(&2));
    assert_eq!(estimate.by_blood_group.get(&BloodGroup::OPos), Some(&1));
    assert!(!estimate.by_blood_group.contains_key(&BloodGroup::BPos));
    assert_eq!(estimate.expected_deliveries, 3 * estimate.channels.len());

    // A preview creates nothing and sends nothing.
    assert_eq!(engine.gateway.call_count(), 0);

    let mut definition = engine.definition(&targets);
    definition.max_distance_km = 50.0;
    let alert = engine
        .alerts
        .create_alert(&engine.ctx, definition)
        .await
        .unwrap();
    let result = engine.dispatcher.dispatch(&engine.ctx, alert.id).await.unwrap();
    engine.dispatcher.drain().await;
    assert_eq!(result.audience_size, estimate.audience_size);
    assert_eq!(result.deliveries.len(), estimate.expected_deliveries);
}

#[tokio::test]
async fn test_estimate_respects_recipient_compatibility_and_ownership() {
    let engine = TestEngine::new(GatewayMode::Accept).await;
    let recipient = engine.add_recipient(BloodGroup::ANeg).await;
    engine.add_nearby_donor(BloodGroup::ONeg).await;
    engine.add_nearby_donor(BloodGroup::APos).await;

    let mut linked = criteria(&[], 25.0);
    linked.recipient_id = Some(recipient.id);
    let estimate = engine
        .dispatcher
        .estimate_audience(&engine.ctx, &linked)
        .await
        .unwrap();
    assert_eq!(estimate.audience_size, 1);

    let stranger = RequestContext::new(HospitalId::new());
    let err = engine
        .dispatcher
        .estimate_audience(&stranger, &linked)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let err = engine
        .dispatcher
        .estimate_audience(&engine.ctx, &criteria(&[], -1.0))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_responses_are_counted_against_reached_donors() {
    let engine = TestEngine::new(GatewayMode::Accept).await;
    let first = engine.add_nearby_donor(BloodGroup::ONeg).await;
    let second = engine.add_nearby_donor(BloodGroup::OPos).await;
    engine.add_nearby_donor(BloodGroup::APos).await;
    engine.add_nearby_donor(BloodGroup::BPos).await;
    let alert = engine.create_alert(&[]).await;
    engine.dispatcher.dispatch(&engine.ctx, alert.id).await.unwrap();
    engine.dispatcher.drain().await;

    engine
        .dispatcher
        .record_response(alert.id, first.id, ResponseKind::Yes)
        .await
        .unwrap();
    let earlier = engine
        .dispatcher
        .record_response(alert.id, second.id, ResponseKind::No)
        .await
        .unwrap();
    // Changing an answer keeps one record per donor.
    let changed = engine
        .dispatcher
        .record_response(alert.id, second.id, ResponseKind::Unavailable)
        .await
        .unwrap();
    assert_eq!(changed.first_responded_at, earlier.first_responded_at);

    let report = engine
        .dispatcher
        .delivery_status(&engine.ctx, alert.id)
        .await
        .unwrap();
    let summary = report.response_summary;
    assert_eq!(summary.reached, 4);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.yes, 1);
    assert_eq!(summary.no, 0);
    assert_eq!(summary.unavailable, 1);
    assert!((summary.response_rate - 0.5).abs() < f64::EPSILON);
    assert_eq!(report.responses.len(), 2);
}

#[tokio::test]
async fn test_response_requires_a_reached_donor_and_active_alert() {
    let engine = TestEngine::new(GatewayMode::RejectPermanent).await;
    let donor = engine.add_nearby_donor(BloodGroup::ONeg).await;
    let alert = engine.create_alert(&[]).await;
    engine.dispatcher.dispatch(&engine.ctx, alert.id).await.unwrap();
    engine.dispatcher.drain().await;

    // Every send was rejected, so the donor never saw the alert.
    let err = engine
        .dispatcher
        .record_response(alert.id, donor.id, ResponseKind::Yes)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = engine
        .dispatcher
        .record_response(alert.id, DonorId::new(), ResponseKind::Yes)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_cancelled_alert_refuses_responses() {
    let engine = TestEngine::new(GatewayMode::Accept).await;
    let donor = engine.add_nearby_donor(BloodGroup::ONeg).await;
    let alert = engine.create_alert(&[]).await;
    engine.dispatcher.dispatch(&engine.ctx, alert.id).await.unwrap();
    engine.dispatcher.drain().await;
    engine
        .dispatcher
        .on_delivery_result(alert.id, donor.id, DeliveryChannel::Push, DeliveryOutcome::Delivered)
        .await
        .unwrap();

    engine.alerts.cancel(&engine.ctx, alert.id).await.unwrap();
    let err = engine
        .dispatcher
        .record_response(alert.id, donor.id, ResponseKind::Yes)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlertNotActive);
}
