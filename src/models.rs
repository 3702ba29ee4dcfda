use serde::Serialize;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STAFF: &str = "staff";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SERVED: &str = "served";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_NO_SHOW: &str = "no_show";
/// Derived at read time for open slots whose end has passed; never stored.
pub const STATUS_EXPIRED: &str = "expired";

pub const TERMINAL_STATUSES: [&str; 3] = [STATUS_SERVED, STATUS_CANCELLED, STATUS_NO_SHOW];

/// Default slot length when one is created without an explicit end time.
pub const SLOT_MINUTES: i64 = 20;

#[allow(dead_code)]
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct StaffRow {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub badge_number: String,
    pub service_tag: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SlotRow {
    pub id: String,
    pub staff_id: String,
    pub starts_at: String,
    pub ends_at: String,
    pub booked: i64,
    pub created_at: String,
}

/// Open slot as shown to candidates, with the owning staff member's
/// public-facing names joined in.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OpenSlotRow {
    pub id: String,
    pub staff_id: String,
    pub starts_at: String,
    pub ends_at: String,
    pub staff_tag: String,
    pub staff_name: String,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AppointmentRow {
    pub id: String,
    pub slot_id: String,
    pub candidate_name: String,
    pub candidate_phone: String,
    pub candidate_email: String,
    pub call_order: String,
    pub visit_reason: String,
    pub visit_type: String,
    pub status: String,
    pub completed_at: Option<String>,
    pub comments: Option<String>,
    pub wants_updates: i64,
    pub consent: i64,
    pub created_at: String,
}

/// Pending appointment joined with its slot's time range. `staff_name` is
/// only populated by the global (admin) listing.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PendingAppointmentRow {
    pub id: String,
    pub slot_id: String,
    pub candidate_name: String,
    pub candidate_phone: String,
    pub candidate_email: String,
    pub call_order: String,
    pub visit_reason: String,
    pub visit_type: String,
    pub status: String,
    pub starts_at: String,
    pub ends_at: String,
    pub staff_name: Option<String>,
}

/// Unified read-model row: either a terminal appointment or an expired
/// unbooked slot. Candidate fields are absent for expired slots.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub starts_at: String,
    pub ends_at: String,
    pub status: String,
    pub staff_name: Option<String>,
    pub candidate_name: Option<String>,
    pub candidate_phone: Option<String>,
    pub candidate_email: Option<String>,
    pub call_order: Option<String>,
    pub visit_reason: Option<String>,
    pub visit_type: Option<String>,
    pub completed_at: Option<String>,
    pub comments: Option<String>,
}
