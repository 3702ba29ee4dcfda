use std::{env, fs, path::Path};

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    models::ROLE_ADMIN,
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Remediation class for an unreachable or broken store. The shell needs to
/// tell a missing schema apart from a transport failure because the fix is
/// different (run migrations vs. check the database file / connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreFault {
    MissingSchema,
    Transport,
    Unknown,
}

impl StoreFault {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSchema => "missing_schema",
            Self::Transport => "transport",
            Self::Unknown => "unknown",
        }
    }
}

pub fn classify(err: &sqlx::Error) -> StoreFault {
    match err {
        sqlx::Error::Database(db) if db.message().contains("no such table") => {
            StoreFault::MissingSchema
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed => StoreFault::Transport,
        _ => StoreFault::Unknown,
    }
}

/// Probes the store with a trivial query and classifies any failure.
pub async fn check_store(pool: &SqlitePool) -> Result<(), (StoreFault, String)> {
    match sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM staff")
        .fetch_one(pool)
        .await
    {
        Ok(_) => Ok(()),
        Err(err) => {
            log::error!("store check failed: {err}");
            Err((classify(&err), err.to_string()))
        }
    }
}

pub async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM staff WHERE role = ? LIMIT 1")
        .bind(ROLE_ADMIN)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(());
    }

    let username = env::var("ADMIN_USER").unwrap_or_else(|_| "admin".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let display_name =
        env::var("ADMIN_DISPLAY_NAME").unwrap_or_else(|_| "Administrator".to_string());

    if password == "admin" {
        log::warn!(
            "ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production."
        );
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO staff (id, username, password_hash, display_name, badge_number, service_tag, role, created_at)
           VALUES (?, ?, ?, ?, '', '', ?, ?)"#,
    )
    .bind(new_id())
    .bind(username)
    .bind(password_hash)
    .bind(display_name)
    .bind(ROLE_ADMIN)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
