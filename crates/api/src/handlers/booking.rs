//! # Booking Handlers
//!
//! The write path for claims on time slots. Two flows are exposed:
//!
//! - **Single-phase**: `reserve` books the slot and creates a confirmed
//!   booking in one transaction.
//! - **Two-phase**: `hold` takes a short-lived claim and creates a
//!   pending booking; `confirm` upgrades it before the hold lapses.
//!
//! In either flow, the first transaction to win the compare-and-set on
//! the slot row owns it; every competitor gets a 409. Payment and
//! notification collaborators run after the commit, never inside it: a
//! post-commit event is emitted instead, and a payment failure is
//! expected to come back as a `cancel` call.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use slotbook_core::{
    errors::BookingError,
    models::booking::{BookingResponse, HoldRequest, ReserveRequest},
};
use slotbook_db::models::DbBooking;
use uuid::Uuid;

use crate::{events, events::BookingEvent, middleware::error_handling::AppError, ApiState};

#[axum::debug_handler]
pub async fn reserve(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<ReserveRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = slotbook_db::repositories::booking::reserve(
        &state.db_pool,
        payload.time_slot_id,
        payload.customer_id,
        payload.notes.as_deref(),
        Utc::now(),
    )
    .await?;

    events::emit(
        &state.events,
        BookingEvent::Reserved {
            booking_id: booking.id,
            customer_id: booking.customer_id,
            provider_id: booking.provider_id,
            time_slot_id: booking.time_slot_id,
        },
    );

    Ok(Json(to_response(booking)?))
}

#[axum::debug_handler]
pub async fn hold(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<HoldRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = slotbook_db::repositories::booking::hold(
        &state.db_pool,
        payload.time_slot_id,
        payload.customer_id,
        payload.notes.as_deref(),
        Utc::now(),
        state.hold_minutes,
    )
    .await?;

    events::emit(
        &state.events,
        BookingEvent::Held {
            booking_id: booking.id,
            customer_id: booking.customer_id,
            provider_id: booking.provider_id,
            time_slot_id: booking.time_slot_id,
        },
    );

    Ok(Json(to_response(booking)?))
}

#[axum::debug_handler]
pub async fn confirm(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking =
        slotbook_db::repositories::booking::confirm(&state.db_pool, id, Utc::now()).await?;

    events::emit(
        &state.events,
        BookingEvent::Confirmed {
            booking_id: booking.id,
            time_slot_id: booking.time_slot_id,
        },
    );

    Ok(Json(to_response(booking)?))
}

#[axum::debug_handler]
pub async fn cancel(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking =
        slotbook_db::repositories::booking::cancel(&state.db_pool, id, Utc::now()).await?;

    events::emit(
        &state.events,
        BookingEvent::Cancelled {
            booking_id: booking.id,
            time_slot_id: booking.time_slot_id,
        },
    );

    Ok(Json(to_response(booking)?))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = slotbook_db::repositories::booking::get_booking_by_id(&state.db_pool, id)
        .await
        .map_err(BookingError::Database)?
        .ok_or(BookingError::BookingNotFound(id))?;

    Ok(Json(to_response(booking)?))
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    /// Optional status filter: pending, confirmed, or cancelled
    pub status: Option<String>,
}

#[axum::debug_handler]
pub async fn list_customer_bookings(
    State(state): State<Arc<ApiState>>,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    if let Some(status) = &query.status {
        // Surface a typo as a 400 instead of an empty list
        status.parse::<slotbook_core::models::booking::BookingStatus>()?;
    }

    let bookings = slotbook_db::repositories::booking::list_bookings_by_customer(
        &state.db_pool,
        customer_id,
        query.status.as_deref(),
    )
    .await
    .map_err(BookingError::Database)?;

    let responses = bookings
        .into_iter()
        .map(to_response)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(responses))
}

fn to_response(booking: DbBooking) -> Result<BookingResponse, AppError> {
    let status = booking
        .status
        .parse()
        .map_err(|_: BookingError| {
            BookingError::Database(eyre::eyre!(
                "unknown booking status in store: {}",
                booking.status
            ))
        })?;

    Ok(BookingResponse {
        id: booking.id,
        customer_id: booking.customer_id,
        provider_id: booking.provider_id,
        time_slot_id: booking.time_slot_id,
        status,
        notes: booking.notes,
        created_at: booking.created_at,
        cancelled_at: booking.cancelled_at,
    })
}
