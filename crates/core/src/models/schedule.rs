use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recurring weekly availability rule for a provider.
///
/// `day_of_week` follows `chrono::Weekday::num_days_from_monday`:
/// Monday is 0, Sunday is 6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWindowRequest {
    pub provider_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_slot_duration")]
    pub slot_duration_minutes: i32,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_slot_duration() -> i32 {
    30
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowResponse {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Materialize slots for every active window of a provider over `[from, to)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsRequest {
    pub provider_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsResponse {
    pub slots_created: u64,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Retention sweep request; `provider_id = None` sweeps every provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSlotsRequest {
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSlotsResponse {
    pub slots_expired: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignStaffRequest {
    pub staff_id: Option<Uuid>,
}
