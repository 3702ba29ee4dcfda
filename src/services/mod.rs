pub mod appointments;
pub mod history;
pub mod reservation;
pub mod slots;
pub mod staff;

use chrono::{DateTime, Utc};

use crate::error::ServiceError;

/// Parses a caller-supplied timestamp and re-renders it in UTC so that
/// stored values compare chronologically as plain strings.
pub(crate) fn normalize_rfc3339(value: &str, field: &'static str) -> Result<String, ServiceError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc).to_rfc3339())
        .map_err(|_| ServiceError::Invalid(format!("{field} must be an RFC 3339 timestamp")))
}
