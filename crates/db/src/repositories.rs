pub mod booking;
pub mod schedule;
pub mod time_slot;

use slotbook_core::errors::BookingError;

pub(crate) fn db_err(err: sqlx::Error) -> BookingError {
    BookingError::Database(err.into())
}
