//! # Error Handling Middleware
//!
//! This module provides a standardized way to map slotbook's domain
//! errors onto HTTP responses. The interesting case is the conflict
//! family: `SlotUnavailable` is an expected outcome of competing
//! reservations, not a bug, and surfaces as 409 so callers present
//! "no longer available" and offer a different slot. Callers must not
//! retry the same slot.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use slotbook_core::errors::BookingError;

/// Application error wrapper that provides HTTP status code mapping.
///
/// `AppError` wraps domain-specific [`BookingError`] instances and
/// implements `IntoResponse` to convert them into HTTP responses with
/// appropriate status codes and JSON payloads.
///
/// # Example
///
/// ```ignore
/// async fn handler(id: Uuid) -> Result<Json<BookingResponse>, AppError> {
///     let booking = repositories::booking::get_booking_by_id(&pool, id)
///         .await
///         .map_err(BookingError::Database)?
///         .ok_or(BookingError::BookingNotFound(id))?;
///
///     Ok(Json(to_response(booking)?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError(pub BookingError);

/// Converts application errors to HTTP responses.
///
/// Validation problems map to 400, missing resources to 404, losing a
/// reservation race to 409, and datastore failures to 500.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map error types to HTTP status codes
        let status = match &self.0 {
            BookingError::InvalidWindow(_)
            | BookingError::RangeTooLarge { .. }
            | BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::SlotUnavailable(_) => StatusCode::CONFLICT,
            BookingError::SlotNotFound(_)
            | BookingError::BookingNotFound(_)
            | BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Get the error message and format as JSON
        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        // Combine status code and JSON body into a response
        (status, body).into_response()
    }
}

/// Automatic conversion from BookingError to AppError.
///
/// This implementation allows using the `?` operator with functions that
/// return `Result<T, BookingError>` in handler functions that return
/// `Result<T, AppError>`.
impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

/// Automatic conversion from eyre::Report to AppError.
///
/// Repository CRUD paths report opaque datastore failures as
/// `eyre::Report`; they surface as 500s.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(BookingError::Database(err))
    }
}
