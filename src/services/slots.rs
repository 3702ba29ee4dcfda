use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono::Datelike;
use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    error::ServiceError,
    models::{OpenSlotRow, SlotRow, SLOT_MINUTES},
    services::normalize_rfc3339,
};

pub async fn add_slot(
    pool: &SqlitePool,
    staff_id: &str,
    starts_at: &str,
    ends_at: Option<&str>,
) -> Result<SlotRow, ServiceError> {
    let starts_at = normalize_rfc3339(starts_at, "starts_at")?;
    let ends_at = match ends_at {
        Some(value) => normalize_rfc3339(value, "ends_at")?,
        None => {
            let start = DateTime::parse_from_rfc3339(&starts_at)
                .map_err(|_| ServiceError::Invalid("starts_at could not be parsed".to_string()))?;
            (start + Duration::minutes(SLOT_MINUTES))
                .with_timezone(&Utc)
                .to_rfc3339()
        }
    };
    if starts_at >= ends_at {
        return Err(ServiceError::Invalid(
            "starts_at must be before ends_at".to_string(),
        ));
    }

    let slot = SlotRow {
        id: new_id(),
        staff_id: staff_id.to_string(),
        starts_at,
        ends_at,
        booked: 0,
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        r#"INSERT INTO slots (id, staff_id, starts_at, ends_at, booked, created_at)
           VALUES (?, ?, ?, ?, 0, ?)"#,
    )
    .bind(&slot.id)
    .bind(&slot.staff_id)
    .bind(&slot.starts_at)
    .bind(&slot.ends_at)
    .bind(&slot.created_at)
    .execute(pool)
    .await?;

    Ok(slot)
}

/// Enumerates every non-overlapping slot of `duration_minutes` that fits
/// the daily window on each matching weekday in the inclusive date range.
/// Times are treated as UTC. Pure calendar arithmetic; nothing is written.
pub fn enumerate_slots(
    range_start: NaiveDate,
    range_end: NaiveDate,
    window_open: NaiveTime,
    window_close: NaiveTime,
    duration_minutes: i64,
    weekdays: &[Weekday],
) -> Result<Vec<(String, String)>, ServiceError> {
    if duration_minutes < 1 {
        return Err(ServiceError::Invalid(
            "duration_minutes must be at least 1".to_string(),
        ));
    }
    if window_open >= window_close {
        return Err(ServiceError::Invalid(
            "window_open must be before window_close".to_string(),
        ));
    }
    if range_start > range_end {
        return Err(ServiceError::Invalid(
            "range_start must not be after range_end".to_string(),
        ));
    }

    let step = Duration::minutes(duration_minutes);
    let mut generated = Vec::new();
    let mut day = range_start;
    loop {
        if weekdays.contains(&day.weekday()) {
            let mut cursor = window_open;
            loop {
                let (end, wrapped) = cursor.overflowing_add_signed(step);
                if wrapped != 0 || end > window_close {
                    break;
                }
                let start_dt = Utc.from_utc_datetime(&day.and_time(cursor));
                let end_dt = Utc.from_utc_datetime(&day.and_time(end));
                generated.push((start_dt.to_rfc3339(), end_dt.to_rfc3339()));
                cursor = end;
            }
        }
        if day >= range_end {
            break;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    Ok(generated)
}

/// Bulk-inserts pre-generated slots inside one transaction.
pub async fn add_slots_batch(
    pool: &SqlitePool,
    staff_id: &str,
    generated: &[(String, String)],
) -> Result<Vec<SlotRow>, ServiceError> {
    if generated.is_empty() {
        return Ok(Vec::new());
    }

    let now = Utc::now().to_rfc3339();
    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(generated.len());

    for (starts_at, ends_at) in generated {
        let slot = SlotRow {
            id: new_id(),
            staff_id: staff_id.to_string(),
            starts_at: starts_at.clone(),
            ends_at: ends_at.clone(),
            booked: 0,
            created_at: now.clone(),
        };
        sqlx::query(
            r#"INSERT INTO slots (id, staff_id, starts_at, ends_at, booked, created_at)
               VALUES (?, ?, ?, ?, 0, ?)"#,
        )
        .bind(&slot.id)
        .bind(&slot.staff_id)
        .bind(&slot.starts_at)
        .bind(&slot.ends_at)
        .bind(&slot.created_at)
        .execute(&mut *tx)
        .await?;
        inserted.push(slot);
    }

    tx.commit().await?;
    Ok(inserted)
}

/// A staff member's own open future slots, soonest first.
pub async fn open_slots_for_staff(
    pool: &SqlitePool,
    staff_id: &str,
) -> Result<Vec<SlotRow>, ServiceError> {
    let now = Utc::now().to_rfc3339();
    let rows = sqlx::query_as::<_, SlotRow>(
        r#"SELECT id, staff_id, starts_at, ends_at, booked, created_at
           FROM slots
           WHERE staff_id = ? AND booked = 0 AND ends_at >= ?
           ORDER BY starts_at"#,
    )
    .bind(staff_id)
    .bind(&now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// All open future slots with the owning staff member's public names,
/// the candidate-facing list.
pub async fn open_slots(pool: &SqlitePool) -> Result<Vec<OpenSlotRow>, ServiceError> {
    let now = Utc::now().to_rfc3339();
    let rows = sqlx::query_as::<_, OpenSlotRow>(
        r#"SELECT s.id, s.staff_id, s.starts_at, s.ends_at,
                  t.service_tag AS staff_tag, t.display_name AS staff_name
           FROM slots s
           JOIN staff t ON s.staff_id = t.id
           WHERE s.booked = 0 AND s.ends_at >= ?
           ORDER BY s.starts_at"#,
    )
    .bind(&now)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_slot(pool: &SqlitePool, slot_id: &str) -> Result<SlotRow, ServiceError> {
    sqlx::query_as::<_, SlotRow>(
        "SELECT id, staff_id, starts_at, ends_at, booked, created_at FROM slots WHERE id = ?",
    )
    .bind(slot_id)
    .fetch_optional(pool)
    .await?
    .ok_or(ServiceError::NotFound("slot"))
}

pub async fn slot_is_booked(pool: &SqlitePool, slot_id: &str) -> Result<bool, ServiceError> {
    let slot = get_slot(pool, slot_id).await?;
    Ok(slot.booked != 0)
}

/// Deletes an open slot. A booked slot cannot be deleted; the candidate's
/// appointment depends on it.
pub async fn delete_slot(pool: &SqlitePool, slot_id: &str) -> Result<(), ServiceError> {
    let result = sqlx::query("DELETE FROM slots WHERE id = ? AND booked = 0")
        .bind(slot_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        if slot_is_booked(pool, slot_id).await? {
            return Err(ServiceError::DependencyExists(
                "this slot was just booked by a candidate and can no longer be removed".to_string(),
            ));
        }
        return Err(ServiceError::NotFound("slot"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn fills_daily_window_without_overlap() {
        // Mon 2026-09-07, 09:00-10:00, 20 min slots.
        let slots = enumerate_slots(
            date(2026, 9, 7),
            date(2026, 9, 7),
            time(9, 0),
            time(10, 0),
            20,
            &[Weekday::Mon],
        )
        .unwrap();

        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].0, "2026-09-07T09:00:00+00:00");
        assert_eq!(slots[0].1, "2026-09-07T09:20:00+00:00");
        assert_eq!(slots[2].0, "2026-09-07T09:40:00+00:00");
        assert_eq!(slots[2].1, "2026-09-07T10:00:00+00:00");
        // Each slot starts where the previous one ended.
        assert_eq!(slots[0].1, slots[1].0);
        assert_eq!(slots[1].1, slots[2].0);
    }

    #[test]
    fn trailing_remainder_is_dropped() {
        // 09:00-09:50 fits two 20 min slots, not three.
        let slots = enumerate_slots(
            date(2026, 9, 7),
            date(2026, 9, 7),
            time(9, 0),
            time(9, 50),
            20,
            &[Weekday::Mon],
        )
        .unwrap();
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn only_selected_weekdays_match() {
        // 2026-09-07 is a Monday; range covers Mon..Sun.
        let slots = enumerate_slots(
            date(2026, 9, 7),
            date(2026, 9, 13),
            time(9, 0),
            time(9, 40),
            20,
            &[Weekday::Tue, Weekday::Thu],
        )
        .unwrap();
        assert_eq!(slots.len(), 4);
        assert!(slots[0].0.starts_with("2026-09-08"));
        assert!(slots[2].0.starts_with("2026-09-10"));
    }

    #[test]
    fn duration_longer_than_window_yields_nothing() {
        let slots = enumerate_slots(
            date(2026, 9, 7),
            date(2026, 9, 7),
            time(9, 0),
            time(9, 30),
            45,
            &[Weekday::Mon],
        )
        .unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn no_weekdays_yields_nothing() {
        let slots = enumerate_slots(
            date(2026, 9, 7),
            date(2026, 9, 13),
            time(9, 0),
            time(10, 0),
            20,
            &[],
        )
        .unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn rejects_inverted_inputs() {
        assert!(enumerate_slots(
            date(2026, 9, 8),
            date(2026, 9, 7),
            time(9, 0),
            time(10, 0),
            20,
            &[Weekday::Mon],
        )
        .is_err());
        assert!(enumerate_slots(
            date(2026, 9, 7),
            date(2026, 9, 7),
            time(10, 0),
            time(9, 0),
            20,
            &[Weekday::Mon],
        )
        .is_err());
        assert!(enumerate_slots(
            date(2026, 9, 7),
            date(2026, 9, 7),
            time(9, 0),
            time(10, 0),
            0,
            &[Weekday::Mon],
        )
        .is_err());
    }
}
