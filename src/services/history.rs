use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::ServiceError,
    models::{HistoryItem, STATUS_EXPIRED, TERMINAL_STATUSES},
    services::normalize_rfc3339,
};

/// Merges terminal appointments and expired unbooked slots into one
/// chronological view, optionally scoped to a single staff member and
/// bounded (inclusive) by the slot's start time. Computed on every call;
/// nothing is persisted.
pub async fn history(
    pool: &SqlitePool,
    staff_id: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    descending: bool,
) -> Result<Vec<HistoryItem>, ServiceError> {
    let from = match from {
        Some(value) => Some(normalize_rfc3339(value, "from")?),
        None => None,
    };
    let to = match to {
        Some(value) => Some(normalize_rfc3339(value, "to")?),
        None => None,
    };
    let now = Utc::now().to_rfc3339();

    let mut items = sqlx::query_as::<_, HistoryItem>(
        r#"SELECT a.id, s.starts_at, s.ends_at, a.status,
                  t.display_name AS staff_name,
                  a.candidate_name, a.candidate_phone, a.candidate_email,
                  a.call_order, a.visit_reason, a.visit_type,
                  a.completed_at, a.comments
           FROM appointments a
           JOIN slots s ON a.slot_id = s.id
           LEFT JOIN staff t ON s.staff_id = t.id
           WHERE a.status IN (?, ?, ?)
             AND (? IS NULL OR s.staff_id = ?)
             AND (? IS NULL OR s.starts_at >= ?)
             AND (? IS NULL OR s.starts_at <= ?)"#,
    )
    .bind(TERMINAL_STATUSES[0])
    .bind(TERMINAL_STATUSES[1])
    .bind(TERMINAL_STATUSES[2])
    .bind(staff_id)
    .bind(staff_id)
    .bind(&from)
    .bind(&from)
    .bind(&to)
    .bind(&to)
    .fetch_all(pool)
    .await?;

    let expired = sqlx::query_as::<_, (String, String, String, Option<String>)>(
        r#"SELECT s.id, s.starts_at, s.ends_at, t.display_name AS staff_name
           FROM slots s
           LEFT JOIN staff t ON s.staff_id = t.id
           WHERE s.booked = 0 AND s.ends_at < ?
             AND (? IS NULL OR s.staff_id = ?)
             AND (? IS NULL OR s.starts_at >= ?)
             AND (? IS NULL OR s.starts_at <= ?)"#,
    )
    .bind(&now)
    .bind(staff_id)
    .bind(staff_id)
    .bind(&from)
    .bind(&from)
    .bind(&to)
    .bind(&to)
    .fetch_all(pool)
    .await?;

    items.extend(
        expired
            .into_iter()
            .map(|(id, starts_at, ends_at, staff_name)| HistoryItem {
                id,
                starts_at,
                ends_at,
                status: STATUS_EXPIRED.to_string(),
                staff_name,
                candidate_name: None,
                candidate_phone: None,
                candidate_email: None,
                call_order: None,
                visit_reason: None,
                visit_type: None,
                completed_at: None,
                comments: None,
            }),
    );

    items.sort_by(|a, b| a.starts_at.cmp(&b.starts_at));
    if descending {
        items.reverse();
    }

    Ok(items)
}
