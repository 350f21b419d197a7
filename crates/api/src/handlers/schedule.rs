use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use slotbook_core::{
    errors::BookingError,
    models::{
        schedule::{
            AssignStaffRequest, CleanupSlotsRequest, CleanupSlotsResponse, CreateWindowRequest,
            GenerateSlotsRequest, GenerateSlotsResponse, WindowResponse,
        },
        time_slot::TimeSlot,
    },
    slots,
};
use slotbook_db::models::{DbScheduleWindow, DbTimeSlot};
use uuid::Uuid;

use crate::{middleware::error_handling::AppError, ApiState};

#[axum::debug_handler]
pub async fn create_window(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CreateWindowRequest>,
) -> Result<Json<WindowResponse>, AppError> {
    // Reject a bad rule before anything is persisted
    slots::validate_window_rule(
        payload.day_of_week,
        payload.start_time,
        payload.end_time,
        payload.slot_duration_minutes,
        &payload.timezone,
    )?;

    let window = slotbook_db::repositories::schedule::create_window(
        &state.db_pool,
        payload.provider_id,
        payload.day_of_week as i16,
        payload.start_time,
        payload.end_time,
        payload.slot_duration_minutes,
        &payload.timezone,
    )
    .await
    .map_err(BookingError::Database)?;

    Ok(Json(window_response(window)))
}

#[axum::debug_handler]
pub async fn get_window(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WindowResponse>, AppError> {
    let window = slotbook_db::repositories::schedule::get_window_by_id(&state.db_pool, id)
        .await
        .map_err(BookingError::Database)?
        .ok_or_else(|| BookingError::NotFound(format!("Schedule window with ID {} not found", id)))?;

    Ok(Json(window_response(window)))
}

#[derive(Debug, Deserialize)]
pub struct ListWindowsQuery {
    /// When true, only windows that still feed slot generation
    pub active_only: Option<bool>,
}

#[axum::debug_handler]
pub async fn list_windows(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<ListWindowsQuery>,
) -> Result<Json<Vec<WindowResponse>>, AppError> {
    let windows = slotbook_db::repositories::schedule::list_windows_by_provider(
        &state.db_pool,
        provider_id,
        query.active_only.unwrap_or(false),
    )
    .await
    .map_err(BookingError::Database)?;

    Ok(Json(windows.into_iter().map(window_response).collect()))
}

/// Soft-deactivation: generation stops picking the window up, while slots
/// already materialized from it stay referenced and bookable.
#[axum::debug_handler]
pub async fn deactivate_window(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<WindowResponse>, AppError> {
    let window = slotbook_db::repositories::schedule::deactivate_window(&state.db_pool, id)
        .await
        .map_err(BookingError::Database)?
        .ok_or_else(|| BookingError::NotFound(format!("Schedule window with ID {} not found", id)))?;

    Ok(Json(window_response(window)))
}

/// Materialize time slots for every active window of a provider over
/// `[from, to)`.
///
/// Generation is idempotent: slots are keyed by `(provider_id, start_at)`
/// and existing rows are never touched, so overlapping re-runs only fill
/// in the gaps. The range is capped to keep a single request's work
/// bounded.
#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<GenerateSlotsRequest>,
) -> Result<Json<GenerateSlotsResponse>, AppError> {
    if payload.from >= payload.to {
        return Err(AppError(BookingError::Validation(format!(
            "empty date range: {} is not before {}",
            payload.from, payload.to
        ))));
    }

    let days = (payload.to - payload.from).num_days();
    if days > state.max_generation_days {
        return Err(AppError(BookingError::RangeTooLarge {
            days,
            max_days: state.max_generation_days,
        }));
    }

    let windows = slotbook_db::repositories::schedule::list_windows_by_provider(
        &state.db_pool,
        payload.provider_id,
        true,
    )
    .await
    .map_err(BookingError::Database)?;

    if windows.is_empty() {
        return Err(AppError(BookingError::NotFound(format!(
            "No active schedule windows for provider {}",
            payload.provider_id
        ))));
    }

    let mut slots_created = 0;
    for window in &windows {
        let intervals = slots::expand_window(&window.to_window(), payload.from, payload.to)?;
        slots_created += slotbook_db::repositories::time_slot::insert_slots(
            &state.db_pool,
            window.provider_id,
            window.id,
            &intervals,
        )
        .await
        .map_err(BookingError::Database)?;
    }

    tracing::info!(
        "Generated {} slots for provider {} over [{}, {})",
        slots_created,
        payload.provider_id,
        payload.from,
        payload.to
    );

    Ok(Json(GenerateSlotsResponse {
        slots_created,
        from: payload.from,
        to: payload.to,
    }))
}

/// Retention sweep over past, never-booked slots.
#[axum::debug_handler]
pub async fn cleanup_slots(
    State(state): State<Arc<ApiState>>,
    Json(payload): Json<CleanupSlotsRequest>,
) -> Result<Json<CleanupSlotsResponse>, AppError> {
    let slots_expired = slotbook_db::repositories::time_slot::expire_past_slots(
        &state.db_pool,
        payload.provider_id,
        Utc::now(),
    )
    .await
    .map_err(BookingError::Database)?;

    Ok(Json(CleanupSlotsResponse { slots_expired }))
}

#[axum::debug_handler]
pub async fn block_slot(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeSlot>, AppError> {
    let slot = slotbook_db::repositories::time_slot::block_slot(&state.db_pool, id).await?;

    Ok(Json(slot_response(slot)?))
}

#[axum::debug_handler]
pub async fn unblock_slot(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<TimeSlot>, AppError> {
    let slot = slotbook_db::repositories::time_slot::unblock_slot(&state.db_pool, id).await?;

    Ok(Json(slot_response(slot)?))
}

#[axum::debug_handler]
pub async fn assign_staff(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignStaffRequest>,
) -> Result<Json<TimeSlot>, AppError> {
    let slot =
        slotbook_db::repositories::time_slot::assign_staff(&state.db_pool, id, payload.staff_id)
            .await?;

    Ok(Json(slot_response(slot)?))
}

fn window_response(window: DbScheduleWindow) -> WindowResponse {
    WindowResponse {
        id: window.id,
        provider_id: window.provider_id,
        day_of_week: window.day_of_week as u8,
        start_time: window.start_time,
        end_time: window.end_time,
        slot_duration_minutes: window.slot_duration_minutes,
        timezone: window.timezone,
        is_active: window.is_active,
        created_at: window.created_at,
    }
}

fn slot_response(slot: DbTimeSlot) -> Result<TimeSlot, AppError> {
    let status = slotbook_db::repositories::time_slot::parse_status(&slot.status)?;

    Ok(TimeSlot {
        id: slot.id,
        provider_id: slot.provider_id,
        schedule_window_id: slot.schedule_window_id,
        staff_id: slot.staff_id,
        start_at: slot.start_at,
        end_at: slot.end_at,
        status,
        hold_expires_at: slot.hold_expires_at,
        created_at: slot.created_at,
    })
}
