use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use slotbook_core::models::schedule::ScheduleWindow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbScheduleWindow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl DbScheduleWindow {
    pub fn to_window(&self) -> ScheduleWindow {
        ScheduleWindow {
            id: self.id,
            provider_id: self.provider_id,
            day_of_week: self.day_of_week as u8,
            start_time: self.start_time,
            end_time: self.end_time,
            slot_duration_minutes: self.slot_duration_minutes,
            timezone: self.timezone.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbTimeSlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub schedule_window_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbBooking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub time_slot_id: Uuid,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}
