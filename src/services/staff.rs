use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    error::ServiceError,
    models::{StaffRow, ROLE_STAFF},
};

#[derive(Debug, Clone, Deserialize)]
pub struct StaffDraft {
    pub username: String,
    pub password: String,
    pub display_name: String,
    #[serde(default)]
    pub badge_number: String,
    #[serde(default)]
    pub service_tag: String,
}

pub async fn create_staff(pool: &SqlitePool, draft: &StaffDraft) -> Result<StaffRow, ServiceError> {
    let required = [
        (draft.username.as_str(), "username"),
        (draft.password.as_str(), "password"),
        (draft.display_name.as_str(), "display_name"),
    ];
    for (value, field) in required {
        if value.trim().is_empty() {
            return Err(ServiceError::Invalid(format!("{field} is required")));
        }
    }

    let password_hash = hash_password(&draft.password)
        .map_err(|_| ServiceError::Invalid("password could not be hashed".to_string()))?;

    let row = StaffRow {
        id: new_id(),
        username: draft.username.trim().to_string(),
        password_hash,
        display_name: draft.display_name.trim().to_string(),
        badge_number: draft.badge_number.trim().to_string(),
        service_tag: draft.service_tag.trim().to_string(),
        role: ROLE_STAFF.to_string(),
        created_at: Utc::now().to_rfc3339(),
    };

    let result = sqlx::query(
        r#"INSERT INTO staff (id, username, password_hash, display_name, badge_number, service_tag, role, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&row.id)
    .bind(&row.username)
    .bind(&row.password_hash)
    .bind(&row.display_name)
    .bind(&row.badge_number)
    .bind(&row.service_tag)
    .bind(&row.role)
    .bind(&row.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(row),
        Err(sqlx::Error::Database(err)) if err.message().contains("UNIQUE") => Err(
            ServiceError::Invalid("username is already taken".to_string()),
        ),
        Err(err) => Err(err.into()),
    }
}

pub async fn list_staff(pool: &SqlitePool) -> Result<Vec<StaffRow>, ServiceError> {
    let rows = sqlx::query_as::<_, StaffRow>(
        r#"SELECT id, username, password_hash, display_name, badge_number, service_tag, role, created_at
           FROM staff
           WHERE role = ?
           ORDER BY display_name"#,
    )
    .bind(ROLE_STAFF)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Deletes a staff account, refusing while any slot still references it.
pub async fn delete_staff(pool: &SqlitePool, staff_id: &str) -> Result<(), ServiceError> {
    let owned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM slots WHERE staff_id = ?")
        .bind(staff_id)
        .fetch_one(pool)
        .await?;
    if owned > 0 {
        return Err(ServiceError::DependencyExists(format!(
            "staff member still owns {owned} slot(s); remove their slots first"
        )));
    }

    let result = sqlx::query("DELETE FROM staff WHERE id = ? AND role = ?")
        .bind(staff_id)
        .bind(ROLE_STAFF)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::NotFound("staff member"));
    }
    Ok(())
}
