use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    error::ServiceError,
    models::{AppointmentRow, STATUS_PENDING},
};

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentDraft {
    pub candidate_name: String,
    pub candidate_phone: String,
    pub candidate_email: String,
    pub call_order: String,
    pub visit_reason: String,
    pub visit_type: String,
    #[serde(default)]
    pub wants_updates: bool,
    #[serde(default)]
    pub consent: bool,
}

fn validate_draft(draft: &AppointmentDraft) -> Result<(), ServiceError> {
    let required = [
        (draft.candidate_name.as_str(), "candidate_name"),
        (draft.candidate_phone.as_str(), "candidate_phone"),
        (draft.candidate_email.as_str(), "candidate_email"),
        (draft.call_order.as_str(), "call_order"),
        (draft.visit_reason.as_str(), "visit_reason"),
        (draft.visit_type.as_str(), "visit_type"),
    ];
    for (value, field) in required {
        if value.trim().is_empty() {
            return Err(ServiceError::Invalid(format!("{field} is required")));
        }
    }
    if !draft.consent {
        return Err(ServiceError::Invalid(
            "consent to data processing is required".to_string(),
        ));
    }
    Ok(())
}

/// Books a slot for a candidate: claims the slot, then records the
/// appointment, both inside one transaction so a failed record phase
/// releases the claim.
///
/// The claim is a conditional update. Of two concurrent callers only one
/// observes a matching row; the loser sees zero rows affected and gets
/// `SlotUnavailable`. A slot whose end time has already passed is treated
/// the same way.
pub async fn reserve(
    pool: &SqlitePool,
    slot_id: &str,
    draft: &AppointmentDraft,
) -> Result<AppointmentRow, ServiceError> {
    validate_draft(draft)?;
    let now = Utc::now().to_rfc3339();

    let mut tx = pool.begin().await?;

    let claimed = sqlx::query("UPDATE slots SET booked = 1 WHERE id = ? AND booked = 0 AND ends_at >= ?")
        .bind(slot_id)
        .bind(&now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if claimed == 0 {
        // Already booked, deleted, or expired. Nothing to undo.
        return Err(ServiceError::SlotUnavailable);
    }

    // Status is forced to pending regardless of caller input.
    let appointment = AppointmentRow {
        id: new_id(),
        slot_id: slot_id.to_string(),
        candidate_name: draft.candidate_name.trim().to_string(),
        candidate_phone: draft.candidate_phone.trim().to_string(),
        candidate_email: draft.candidate_email.trim().to_string(),
        call_order: draft.call_order.trim().to_string(),
        visit_reason: draft.visit_reason.trim().to_string(),
        visit_type: draft.visit_type.trim().to_string(),
        status: STATUS_PENDING.to_string(),
        completed_at: None,
        comments: None,
        wants_updates: draft.wants_updates as i64,
        consent: draft.consent as i64,
        created_at: now,
    };

    let inserted = sqlx::query(
        r#"INSERT INTO appointments
           (id, slot_id, candidate_name, candidate_phone, candidate_email,
            call_order, visit_reason, visit_type, status, completed_at,
            comments, wants_updates, consent, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&appointment.id)
    .bind(&appointment.slot_id)
    .bind(&appointment.candidate_name)
    .bind(&appointment.candidate_phone)
    .bind(&appointment.candidate_email)
    .bind(&appointment.call_order)
    .bind(&appointment.visit_reason)
    .bind(&appointment.visit_type)
    .bind(&appointment.status)
    .bind(&appointment.completed_at)
    .bind(&appointment.comments)
    .bind(appointment.wants_updates)
    .bind(appointment.consent)
    .bind(&appointment.created_at)
    .execute(&mut *tx)
    .await;

    if let Err(err) = inserted {
        log::error!("appointment insert failed for slot {slot_id}, releasing claim: {err}");
        if let Err(rollback_err) = tx.rollback().await {
            log::error!("claim release failed for slot {slot_id}: {rollback_err}");
        }
        return Err(ServiceError::ReservationFailed);
    }

    tx.commit().await.map_err(|err| {
        log::error!("reservation commit failed for slot {slot_id}: {err}");
        ServiceError::ReservationFailed
    })?;

    Ok(appointment)
}
