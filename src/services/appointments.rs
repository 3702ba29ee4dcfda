use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    error::ServiceError,
    models::{PendingAppointmentRow, STATUS_PENDING, TERMINAL_STATUSES},
    services::normalize_rfc3339,
};

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    pub completed_at: Option<String>,
    pub comments: Option<String>,
}

/// Moves a pending appointment to a terminal status. Only the three
/// terminal values are accepted; a completed appointment cannot be moved
/// back to pending. When the caller omits a completion time, now is
/// recorded.
pub async fn set_status(
    pool: &SqlitePool,
    appointment_id: &str,
    update: &StatusUpdate,
) -> Result<(), ServiceError> {
    if !TERMINAL_STATUSES.contains(&update.status.as_str()) {
        return Err(ServiceError::Invalid(format!(
            "status must be one of {}",
            TERMINAL_STATUSES.join(", ")
        )));
    }

    let completed_at = match update.completed_at.as_deref() {
        Some(value) => normalize_rfc3339(value, "completed_at")?,
        None => Utc::now().to_rfc3339(),
    };

    let result =
        sqlx::query("UPDATE appointments SET status = ?, completed_at = ?, comments = ? WHERE id = ?")
            .bind(&update.status)
            .bind(&completed_at)
            .bind(&update.comments)
            .bind(appointment_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::NotFound("appointment"));
    }
    Ok(())
}

/// The staff member that owns the appointment's slot.
pub async fn owner_of(pool: &SqlitePool, appointment_id: &str) -> Result<String, ServiceError> {
    sqlx::query_scalar::<_, String>(
        r#"SELECT s.staff_id
           FROM appointments a
           JOIN slots s ON a.slot_id = s.id
           WHERE a.id = ?"#,
    )
    .bind(appointment_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ServiceError::NotFound("appointment"))
}

pub async fn pending_for_staff(
    pool: &SqlitePool,
    staff_id: &str,
) -> Result<Vec<PendingAppointmentRow>, ServiceError> {
    let rows = sqlx::query_as::<_, PendingAppointmentRow>(
        r#"SELECT a.id, a.slot_id, a.candidate_name, a.candidate_phone, a.candidate_email,
                  a.call_order, a.visit_reason, a.visit_type, a.status,
                  s.starts_at, s.ends_at,
                  NULL AS staff_name
           FROM appointments a
           JOIN slots s ON a.slot_id = s.id
           WHERE s.staff_id = ? AND a.status = ?
           ORDER BY s.starts_at"#,
    )
    .bind(staff_id)
    .bind(STATUS_PENDING)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn pending_all(pool: &SqlitePool) -> Result<Vec<PendingAppointmentRow>, ServiceError> {
    let rows = sqlx::query_as::<_, PendingAppointmentRow>(
        r#"SELECT a.id, a.slot_id, a.candidate_name, a.candidate_phone, a.candidate_email,
                  a.call_order, a.visit_reason, a.visit_type, a.status,
                  s.starts_at, s.ends_at,
                  t.display_name AS staff_name
           FROM appointments a
           JOIN slots s ON a.slot_id = s.id
           LEFT JOIN staff t ON s.staff_id = t.id
           WHERE a.status = ?
           ORDER BY s.starts_at"#,
    )
    .bind(STATUS_PENDING)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
