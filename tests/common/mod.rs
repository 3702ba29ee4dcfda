#![allow(dead_code)] // each test binary uses a subset of these fixtures

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

use admitdesk::models::{SlotRow, StaffRow};
use admitdesk::services::reservation::AppointmentDraft;
use admitdesk::services::staff::StaffDraft;
use admitdesk::services::{slots, staff};

/// File-backed pool in a tempdir; the TempDir must outlive the pool.
pub async fn test_pool() -> (SqlitePool, TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("admitdesk-test.db");
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))
        .expect("connect options")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("connect");
    admitdesk::db::run_migrations(&pool).await.expect("migrations");
    (pool, dir)
}

pub async fn seed_staff(pool: &SqlitePool, username: &str, display_name: &str) -> StaffRow {
    staff::create_staff(
        pool,
        &StaffDraft {
            username: username.to_string(),
            password: "s3cret-pw".to_string(),
            display_name: display_name.to_string(),
            badge_number: "12345".to_string(),
            service_tag: "Desk 1".to_string(),
        },
    )
    .await
    .expect("create staff")
}

pub async fn seed_slot(
    pool: &SqlitePool,
    staff_id: &str,
    starts_at: &str,
    ends_at: &str,
) -> SlotRow {
    slots::add_slot(pool, staff_id, starts_at, Some(ends_at))
        .await
        .expect("create slot")
}

pub fn draft(candidate_name: &str) -> AppointmentDraft {
    AppointmentDraft {
        candidate_name: candidate_name.to_string(),
        candidate_phone: "+55 21 99999-0000".to_string(),
        candidate_email: "candidate@example.com".to_string(),
        call_order: "First call".to_string(),
        visit_reason: "Document delivery".to_string(),
        visit_type: "First visit".to_string(),
        wants_updates: false,
        consent: true,
    }
}

pub async fn slot_booked(pool: &SqlitePool, slot_id: &str) -> bool {
    sqlx::query_scalar::<_, i64>("SELECT booked FROM slots WHERE id = ?")
        .bind(slot_id)
        .fetch_one(pool)
        .await
        .expect("slot exists")
        != 0
}

pub async fn appointment_count(pool: &SqlitePool, slot_id: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appointments WHERE slot_id = ?")
        .bind(slot_id)
        .fetch_one(pool)
        .await
        .expect("count")
}
