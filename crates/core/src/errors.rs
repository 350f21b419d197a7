use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Invalid schedule window: {0}")]
    InvalidWindow(String),

    #[error("Requested range of {days} days exceeds the {max_days}-day generation ceiling")]
    RangeTooLarge { days: i64, max_days: i64 },

    #[error("Time slot {0} is no longer available")]
    SlotUnavailable(Uuid),

    #[error("Time slot not found: {0}")]
    SlotNotFound(Uuid),

    #[error("Booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] eyre::Report),
}

pub type BookingResult<T> = Result<T, BookingError>;
