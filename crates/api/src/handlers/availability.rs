//! # Availability Handlers
//!
//! Read-only queries answering "which slots can a customer claim for this
//! provider in this range". The read path is side-effect free and safe
//! under unbounded concurrency; every ordering guarantee for the write
//! path lives in the booking transaction, not here.
//!
//! ## Lazy hold expiry
//!
//! A held slot whose hold window has lapsed is claimable again. The query
//! treats such slots as free directly in its predicate instead of
//! sweeping them back to `free` in the background: correctness never
//! depends on a sweeper having run, and the read path stays write-free.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use slotbook_core::{
    errors::BookingError,
    models::time_slot::{AvailabilityResponse, TimeSlotResponse},
};
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

/// Query parameters for the availability listing endpoint.
///
/// `from` and `to` bound the half-open interval `[from, to)` on slot
/// start times; `staff_id` optionally narrows results to slots
/// pre-assigned to one staff member.
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub provider_id: Uuid,

    pub from: DateTime<Utc>,

    pub to: DateTime<Utc>,

    /// Optional sub-resource filter
    pub staff_id: Option<Uuid>,
}

/// Lists claimable slots for a provider, ordered by start time.
///
/// # Endpoint
///
/// ```text
/// GET /api/availability?provider_id=...&from=2025-01-06T00:00:00Z&to=2025-01-07T00:00:00Z
/// ```
#[axum::debug_handler]
pub async fn list_availability(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    if query.from >= query.to {
        return Err(AppError(BookingError::Validation(format!(
            "empty time range: {} is not before {}",
            query.from, query.to
        ))));
    }

    let slots = slotbook_db::repositories::time_slot::list_available(
        &state.db_pool,
        query.provider_id,
        query.from,
        query.to,
        query.staff_id,
        Utc::now(),
    )
    .await
    .map_err(BookingError::Database)?;

    let slots: Vec<TimeSlotResponse> = slots
        .into_iter()
        .map(|slot| TimeSlotResponse {
            id: slot.id,
            start_at: slot.start_at,
            end_at: slot.end_at,
            staff_id: slot.staff_id,
        })
        .collect();

    let response = AvailabilityResponse {
        provider_id: query.provider_id,
        from: query.from,
        to: query.to,
        total_slots: slots.len(),
        slots,
    };

    Ok(Json(response))
}
