use chrono::{DateTime, NaiveTime, Utc};
use mockall::mock;
use slotbook_core::errors::BookingResult;
use slotbook_core::slots::SlotInterval;
use uuid::Uuid;

use crate::models::{DbBooking, DbScheduleWindow, DbTimeSlot};

// Mock repositories for testing
mock! {
    pub WindowRepo {
        pub async fn create_window(
            &self,
            provider_id: Uuid,
            day_of_week: i16,
            start_time: NaiveTime,
            end_time: NaiveTime,
            slot_duration_minutes: i32,
            timezone: &'static str,
        ) -> eyre::Result<DbScheduleWindow>;

        pub async fn get_window_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbScheduleWindow>>;

        pub async fn list_windows_by_provider(
            &self,
            provider_id: Uuid,
            active_only: bool,
        ) -> eyre::Result<Vec<DbScheduleWindow>>;

        pub async fn deactivate_window(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbScheduleWindow>>;
    }
}

mock! {
    pub TimeSlotRepo {
        pub async fn insert_slots(
            &self,
            provider_id: Uuid,
            schedule_window_id: Uuid,
            intervals: Vec<SlotInterval>,
        ) -> eyre::Result<u64>;

        pub async fn list_available(
            &self,
            provider_id: Uuid,
            from: DateTime<Utc>,
            to: DateTime<Utc>,
            staff_id: Option<Uuid>,
            now: DateTime<Utc>,
        ) -> eyre::Result<Vec<DbTimeSlot>>;

        pub async fn get_slot_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbTimeSlot>>;

        pub async fn block_slot(&self, id: Uuid) -> BookingResult<DbTimeSlot>;

        pub async fn unblock_slot(&self, id: Uuid) -> BookingResult<DbTimeSlot>;

        pub async fn assign_staff(
            &self,
            id: Uuid,
            staff_id: Option<Uuid>,
        ) -> BookingResult<DbTimeSlot>;

        pub async fn expire_past_slots(
            &self,
            provider_id: Option<Uuid>,
            now: DateTime<Utc>,
        ) -> eyre::Result<u64>;
    }
}

mock! {
    pub BookingRepo {
        pub async fn reserve(
            &self,
            slot_id: Uuid,
            customer_id: Uuid,
            notes: Option<&'static str>,
            now: DateTime<Utc>,
        ) -> BookingResult<DbBooking>;

        pub async fn hold(
            &self,
            slot_id: Uuid,
            customer_id: Uuid,
            notes: Option<&'static str>,
            now: DateTime<Utc>,
            hold_minutes: i64,
        ) -> BookingResult<DbBooking>;

        pub async fn confirm(
            &self,
            booking_id: Uuid,
            now: DateTime<Utc>,
        ) -> BookingResult<DbBooking>;

        pub async fn cancel(
            &self,
            booking_id: Uuid,
            now: DateTime<Utc>,
        ) -> BookingResult<DbBooking>;

        pub async fn get_booking_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbBooking>>;

        pub async fn list_bookings_by_customer(
            &self,
            customer_id: Uuid,
            status: Option<&'static str>,
        ) -> eyre::Result<Vec<DbBooking>>;
    }
}
