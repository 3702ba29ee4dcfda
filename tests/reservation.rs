mod common;

use chrono::{Duration, Utc};
use futures::future::join_all;

use admitdesk::error::ServiceError;
use admitdesk::models::{STATUS_PENDING, STATUS_SERVED};
use admitdesk::services::appointments::{self, StatusUpdate};
use admitdesk::services::{history, reservation};

use common::{appointment_count, draft, seed_slot, seed_staff, slot_booked, test_pool};

fn in_hours(hours: i64) -> String {
    (Utc::now() + Duration::hours(hours)).to_rfc3339()
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reservations_have_exactly_one_winner() {
    let (pool, _dir) = test_pool().await;
    let staff = seed_staff(&pool, "ana", "Ana Souza").await;
    let slot = seed_slot(&pool, &staff.id, &in_hours(2), &in_hours(3)).await;

    let attempts = 5;
    let tasks: Vec<_> = (0..attempts)
        .map(|i| {
            let pool = pool.clone();
            let slot_id = slot.id.clone();
            tokio::spawn(async move {
                reservation::reserve(&pool, &slot_id, &common::draft(&format!("Candidate {i}")))
                    .await
            })
        })
        .collect();

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::SlotUnavailable)))
        .count();

    assert_eq!(winners, 1);
    assert_eq!(losers, attempts - 1);
    assert_eq!(appointment_count(&pool, &slot.id).await, 1);
    assert!(slot_booked(&pool, &slot.id).await);
}

#[tokio::test]
async fn failed_record_phase_releases_the_claim() {
    let (pool, _dir) = test_pool().await;
    let staff = seed_staff(&pool, "bea", "Beatriz Lima").await;
    let slot = seed_slot(&pool, &staff.id, &in_hours(2), &in_hours(3)).await;

    // Arm a UNIQUE(slot_id) violation for the record phase while leaving
    // the slot itself unbooked, so the claim succeeds and the insert fails.
    sqlx::query(
        r#"INSERT INTO appointments
           (id, slot_id, candidate_name, candidate_phone, candidate_email,
            call_order, visit_reason, visit_type, status, wants_updates, consent, created_at)
           VALUES ('pre-existing', ?, 'Ghost', '0', 'ghost@example.com',
                   'First call', 'Other', 'First visit', 'pending', 0, 1, ?)"#,
    )
    .bind(&slot.id)
    .bind(Utc::now().to_rfc3339())
    .execute(&pool)
    .await
    .expect("seed conflicting appointment");

    let result = reservation::reserve(&pool, &slot.id, &draft("Carla")).await;
    assert!(matches!(result, Err(ServiceError::ReservationFailed)));
    assert!(!slot_booked(&pool, &slot.id).await, "claim must be released");
}

#[tokio::test]
async fn booked_slot_rejects_further_attempts() {
    let (pool, _dir) = test_pool().await;
    let staff = seed_staff(&pool, "caio", "Caio Mendes").await;
    let slot = seed_slot(&pool, &staff.id, &in_hours(2), &in_hours(3)).await;

    reservation::reserve(&pool, &slot.id, &draft("First"))
        .await
        .expect("first reservation");
    let second = reservation::reserve(&pool, &slot.id, &draft("Second")).await;

    assert!(matches!(second, Err(ServiceError::SlotUnavailable)));
    assert_eq!(appointment_count(&pool, &slot.id).await, 1);
}

#[tokio::test]
async fn expired_and_missing_slots_are_unavailable() {
    let (pool, _dir) = test_pool().await;
    let staff = seed_staff(&pool, "davi", "Davi Rocha").await;
    let expired = seed_slot(&pool, &staff.id, &in_hours(-3), &in_hours(-2)).await;

    let result = reservation::reserve(&pool, &expired.id, &draft("Late")).await;
    assert!(matches!(result, Err(ServiceError::SlotUnavailable)));
    assert!(!slot_booked(&pool, &expired.id).await);

    let missing = reservation::reserve(&pool, "no-such-slot", &draft("Lost")).await;
    assert!(matches!(missing, Err(ServiceError::SlotUnavailable)));
}

#[tokio::test]
async fn reservation_forces_pending_and_requires_consent() {
    let (pool, _dir) = test_pool().await;
    let staff = seed_staff(&pool, "eva", "Eva Martins").await;
    let slot = seed_slot(&pool, &staff.id, &in_hours(2), &in_hours(3)).await;

    let mut no_consent = draft("Refused");
    no_consent.consent = false;
    let refused = reservation::reserve(&pool, &slot.id, &no_consent).await;
    assert!(matches!(refused, Err(ServiceError::Invalid(_))));
    assert!(!slot_booked(&pool, &slot.id).await);

    let appointment = reservation::reserve(&pool, &slot.id, &draft("Fabio"))
        .await
        .expect("reservation");
    assert_eq!(appointment.status, STATUS_PENDING);
    assert!(appointment.completed_at.is_none());
}

// Slot S (09:00-09:20) for staff A: reserve, serve, then the staff history
// shows exactly one served item at the slot's start.
#[tokio::test]
async fn reserve_serve_history_round_trip() {
    let (pool, _dir) = test_pool().await;
    let staff = seed_staff(&pool, "gil", "Gil Santos").await;
    let starts_at = in_hours(1);
    let ends_at = in_hours(2);
    let slot = seed_slot(&pool, &staff.id, &starts_at, &ends_at).await;

    let appointment = reservation::reserve(&pool, &slot.id, &draft("Helena"))
        .await
        .expect("reservation");
    assert!(slot_booked(&pool, &slot.id).await);

    appointments::set_status(
        &pool,
        &appointment.id,
        &StatusUpdate {
            status: STATUS_SERVED.to_string(),
            completed_at: None,
            comments: Some("walked in early".to_string()),
        },
    )
    .await
    .expect("status update");

    let items = history::history(&pool, Some(&staff.id), None, None, false)
        .await
        .expect("history");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].status, STATUS_SERVED);
    assert_eq!(items[0].starts_at, slot.starts_at);
    assert_eq!(items[0].candidate_name.as_deref(), Some("Helena"));
    assert_eq!(items[0].comments.as_deref(), Some("walked in early"));
    assert!(items[0].completed_at.is_some());
}

#[tokio::test]
async fn status_cannot_return_to_pending() {
    let (pool, _dir) = test_pool().await;
    let staff = seed_staff(&pool, "ivo", "Ivo Costa").await;
    let slot = seed_slot(&pool, &staff.id, &in_hours(1), &in_hours(2)).await;
    let appointment = reservation::reserve(&pool, &slot.id, &draft("Joana"))
        .await
        .expect("reservation");

    appointments::set_status(
        &pool,
        &appointment.id,
        &StatusUpdate {
            status: STATUS_SERVED.to_string(),
            completed_at: None,
            comments: None,
        },
    )
    .await
    .expect("terminal update");

    let back = appointments::set_status(
        &pool,
        &appointment.id,
        &StatusUpdate {
            status: STATUS_PENDING.to_string(),
            completed_at: None,
            comments: None,
        },
    )
    .await;
    assert!(matches!(back, Err(ServiceError::Invalid(_))));
}
