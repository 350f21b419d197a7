use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::BookingError;

/// Persisted slot status.
///
/// `Cancelled` is the provider-block state; `Expired` is stamped by the
/// retention sweep on past slots that were never booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Free,
    Held,
    Booked,
    Cancelled,
    Expired,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Free => "free",
            SlotStatus::Held => "held",
            SlotStatus::Booked => "booked",
            SlotStatus::Cancelled => "cancelled",
            SlotStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SlotStatus::Free),
            "held" => Ok(SlotStatus::Held),
            "booked" => Ok(SlotStatus::Booked),
            "cancelled" => Ok(SlotStatus::Cancelled),
            "expired" => Ok(SlotStatus::Expired),
            other => Err(BookingError::Validation(format!(
                "unknown slot status: {other}"
            ))),
        }
    }
}

/// The status a slot presents once lapsed holds are accounted for.
///
/// A held slot whose hold has expired is free for every read and write
/// path; nothing sweeps it in the background.
pub fn effective_status(
    status: SlotStatus,
    hold_expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> SlotStatus {
    match status {
        SlotStatus::Held if hold_expires_at.is_none_or(|expires| expires <= now) => {
            SlotStatus::Free
        }
        other => other,
    }
}

/// One materialized, individually bookable time interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub schedule_window_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: SlotStatus,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TimeSlot {
    pub fn effective_status(&self, now: DateTime<Utc>) -> SlotStatus {
        effective_status(self.status, self.hold_expires_at, now)
    }

    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == SlotStatus::Free
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotResponse {
    pub id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub staff_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub provider_id: Uuid,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_slots: usize,
    pub slots: Vec<TimeSlotResponse>,
}
