use crate::models::DbTimeSlot;
use crate::repositories::db_err;
use chrono::{DateTime, Utc};
use eyre::Result;
use slotbook_core::errors::{BookingError, BookingResult};
use slotbook_core::models::time_slot::SlotStatus;
use slotbook_core::slots::SlotInterval;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Persist expanded intervals as free slots.
///
/// Keyed on `(provider_id, start_at)`: an interval that already has a slot
/// is left untouched, whatever its status, so regeneration over an
/// overlapping range inserts only the missing ones.
pub async fn insert_slots(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    schedule_window_id: Uuid,
    intervals: &[SlotInterval],
) -> Result<u64> {
    let now = Utc::now();
    let mut created = 0;

    for interval in intervals {
        let inserted = sqlx::query(
            r#"
            INSERT INTO time_slots
                (id, provider_id, schedule_window_id, start_at, end_at, status, created_at)
            VALUES ($1, $2, $3, $4, $5, 'free', $6)
            ON CONFLICT (provider_id, start_at) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(provider_id)
        .bind(schedule_window_id)
        .bind(interval.start_at)
        .bind(interval.end_at)
        .bind(now)
        .execute(pool)
        .await?
        .rows_affected();

        created += inserted;
    }

    tracing::debug!(
        "Materialized {} of {} intervals for window {}",
        created,
        intervals.len(),
        schedule_window_id
    );

    Ok(created)
}

/// Slots a customer could claim right now: free, or held past their hold
/// expiry (lazy expiry happens in the predicate, not via a sweeper).
pub async fn list_available(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    staff_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<Vec<DbTimeSlot>> {
    let slots = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        SELECT id, provider_id, schedule_window_id, staff_id, start_at, end_at,
               status, hold_expires_at, created_at
        FROM time_slots
        WHERE provider_id = $1
          AND start_at >= $2
          AND start_at < $3
          AND (status = 'free'
               OR (status = 'held' AND (hold_expires_at IS NULL OR hold_expires_at <= $4)))
          AND ($5::UUID IS NULL OR staff_id = $5)
        ORDER BY start_at ASC
        "#,
    )
    .bind(provider_id)
    .bind(from)
    .bind(to)
    .bind(now)
    .bind(staff_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

pub async fn get_slot_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbTimeSlot>> {
    let slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        SELECT id, provider_id, schedule_window_id, staff_id, start_at, end_at,
               status, hold_expires_at, created_at
        FROM time_slots
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(slot)
}

/// Provider-side block: takes a free slot out of circulation without
/// deleting it. Blocking an already-blocked slot is a no-op.
pub async fn block_slot(pool: &Pool<Postgres>, id: Uuid) -> BookingResult<DbTimeSlot> {
    let slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        UPDATE time_slots
        SET status = 'cancelled', hold_expires_at = NULL
        WHERE id = $1 AND status IN ('free', 'cancelled')
        RETURNING id, provider_id, schedule_window_id, staff_id, start_at, end_at,
                  status, hold_expires_at, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_err)?;

    match slot {
        Some(slot) => Ok(slot),
        None => Err(slot_conflict(pool, id, "block").await?),
    }
}

pub async fn unblock_slot(pool: &Pool<Postgres>, id: Uuid) -> BookingResult<DbTimeSlot> {
    let slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        UPDATE time_slots
        SET status = 'free'
        WHERE id = $1 AND status IN ('cancelled', 'free')
        RETURNING id, provider_id, schedule_window_id, staff_id, start_at, end_at,
                  status, hold_expires_at, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_err)?;

    match slot {
        Some(slot) => Ok(slot),
        None => Err(slot_conflict(pool, id, "unblock").await?),
    }
}

/// Pre-assign (or clear) the staff member expected to serve a slot.
pub async fn assign_staff(
    pool: &Pool<Postgres>,
    id: Uuid,
    staff_id: Option<Uuid>,
) -> BookingResult<DbTimeSlot> {
    let slot = sqlx::query_as::<_, DbTimeSlot>(
        r#"
        UPDATE time_slots
        SET staff_id = $2
        WHERE id = $1
        RETURNING id, provider_id, schedule_window_id, staff_id, start_at, end_at,
                  status, hold_expires_at, created_at
        "#,
    )
    .bind(id)
    .bind(staff_id)
    .fetch_optional(pool)
    .await
    .map_err(db_err)?;

    slot.ok_or(BookingError::SlotNotFound(id))
}

/// Retention sweep: stamp past, never-booked slots as expired. Storage
/// hygiene only; availability and reservation never depend on it running.
pub async fn expire_past_slots(
    pool: &Pool<Postgres>,
    provider_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<u64> {
    let expired = sqlx::query(
        r#"
        UPDATE time_slots
        SET status = 'expired', hold_expires_at = NULL
        WHERE end_at <= $1
          AND status IN ('free', 'cancelled')
          AND ($2::UUID IS NULL OR provider_id = $2)
        "#,
    )
    .bind(now)
    .bind(provider_id)
    .execute(pool)
    .await?
    .rows_affected();

    tracing::debug!("Expired {} past slots", expired);

    Ok(expired)
}

/// Distinguish a missing slot from one in a state the operation rejects.
async fn slot_conflict(
    pool: &Pool<Postgres>,
    id: Uuid,
    operation: &str,
) -> BookingResult<BookingError> {
    let status = sqlx::query_scalar::<_, String>("SELECT status FROM time_slots WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_err)?;

    match status {
        None => Ok(BookingError::SlotNotFound(id)),
        Some(status) => Ok(BookingError::Validation(format!(
            "cannot {operation} a {status} time slot"
        ))),
    }
}

/// Map a stored status string back to the domain enum.
pub fn parse_status(status: &str) -> BookingResult<SlotStatus> {
    status
        .parse::<SlotStatus>()
        .map_err(|_| BookingError::Database(eyre::eyre!("unknown slot status in store: {status}")))
}
