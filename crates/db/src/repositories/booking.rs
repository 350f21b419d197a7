//! The only write path that takes a time slot out of `free`.
//!
//! Every operation here runs inside one transaction. The claim itself is a
//! compare-and-set: a conditional `UPDATE .. RETURNING` on the slot row
//! that only matches a claimable slot. Competing transactions serialize on
//! that row; the first committer wins and every loser observes zero rows
//! and fails with `SlotUnavailable`. A held slot whose hold has lapsed
//! counts as claimable, and the stale pending booking it leaves behind is
//! cancelled inside the same transaction so the one-active-booking-per-slot
//! index stays satisfiable.

use crate::models::DbBooking;
use crate::repositories::db_err;
use chrono::{DateTime, Duration, Utc};
use eyre::Result;
use slotbook_core::errors::{BookingError, BookingResult};
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

const CLAIM_SLOT_SQL: &str = r#"
    UPDATE time_slots
    SET status = $3, hold_expires_at = $4
    WHERE id = $1
      AND (status = 'free'
           OR (status = 'held' AND (hold_expires_at IS NULL OR hold_expires_at <= $2)))
    RETURNING id
"#;

/// Single-phase reservation: slot `free -> booked`, booking born confirmed.
pub async fn reserve(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    customer_id: Uuid,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> BookingResult<DbBooking> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    claim_slot(&mut tx, slot_id, now, "booked", None).await?;
    supersede_stale_hold(&mut tx, slot_id, now).await?;
    let booking = insert_booking(&mut tx, slot_id, customer_id, notes, "confirmed", now).await?;

    tx.commit().await.map_err(db_err)?;

    tracing::debug!("Reserved slot {} for customer {}", slot_id, customer_id);
    Ok(booking)
}

/// Two-phase claim: slot `free -> held` until the hold window lapses,
/// booking born pending.
pub async fn hold(
    pool: &Pool<Postgres>,
    slot_id: Uuid,
    customer_id: Uuid,
    notes: Option<&str>,
    now: DateTime<Utc>,
    hold_minutes: i64,
) -> BookingResult<DbBooking> {
    let expires_at = now + Duration::minutes(hold_minutes);
    let mut tx = pool.begin().await.map_err(db_err)?;

    claim_slot(&mut tx, slot_id, now, "held", Some(expires_at)).await?;
    supersede_stale_hold(&mut tx, slot_id, now).await?;
    let booking = insert_booking(&mut tx, slot_id, customer_id, notes, "pending", now).await?;

    tx.commit().await.map_err(db_err)?;

    tracing::debug!(
        "Held slot {} for customer {} until {}",
        slot_id,
        customer_id,
        expires_at
    );
    Ok(booking)
}

/// Confirm a pending hold. Idempotent for already-confirmed bookings. If
/// the hold lapsed before confirmation the claim is released and the call
/// fails with `SlotUnavailable`; the caller must start over.
pub async fn confirm(
    pool: &Pool<Postgres>,
    booking_id: Uuid,
    now: DateTime<Utc>,
) -> BookingResult<DbBooking> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    let booking = lock_booking(&mut tx, booking_id).await?;

    let status = booking.status.clone();
    match status.as_str() {
        "confirmed" => Ok(booking),
        "cancelled" => Err(BookingError::SlotUnavailable(booking.time_slot_id)),
        "pending" => {
            let live = sqlx::query_scalar::<_, Uuid>(
                r#"
                UPDATE time_slots
                SET status = 'booked', hold_expires_at = NULL
                WHERE id = $1
                  AND status = 'held'
                  AND hold_expires_at IS NOT NULL
                  AND hold_expires_at > $2
                RETURNING id
                "#,
            )
            .bind(booking.time_slot_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

            if live.is_none() {
                // Hold lapsed: release both sides and tell the caller.
                sqlx::query(
                    "UPDATE bookings SET status = 'cancelled', cancelled_at = $2 WHERE id = $1",
                )
                .bind(booking.id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
                sqlx::query(
                    "UPDATE time_slots SET status = 'free', hold_expires_at = NULL
                     WHERE id = $1 AND status = 'held'",
                )
                .bind(booking.time_slot_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
                tx.commit().await.map_err(db_err)?;

                return Err(BookingError::SlotUnavailable(booking.time_slot_id));
            }

            let confirmed = sqlx::query_as::<_, DbBooking>(
                r#"
                UPDATE bookings
                SET status = 'confirmed'
                WHERE id = $1
                RETURNING id, customer_id, provider_id, time_slot_id, status, notes,
                          created_at, cancelled_at
                "#,
            )
            .bind(booking.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

            tx.commit().await.map_err(db_err)?;

            tracing::debug!("Confirmed booking {}", booking_id);
            Ok(confirmed)
        }
        other => Err(BookingError::Database(eyre::eyre!(
            "unknown booking status in store: {other}"
        ))),
    }
}

/// Cancel a booking and hand its slot back. Cancelling a booking that is
/// already cancelled succeeds without touching anything, so retrying
/// callers never see an error they have to special-case.
pub async fn cancel(
    pool: &Pool<Postgres>,
    booking_id: Uuid,
    now: DateTime<Utc>,
) -> BookingResult<DbBooking> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    let booking = lock_booking(&mut tx, booking_id).await?;

    if booking.status == "cancelled" {
        return Ok(booking);
    }

    let cancelled = sqlx::query_as::<_, DbBooking>(
        r#"
        UPDATE bookings
        SET status = 'cancelled', cancelled_at = $2
        WHERE id = $1
        RETURNING id, customer_id, provider_id, time_slot_id, status, notes,
                  created_at, cancelled_at
        "#,
    )
    .bind(booking.id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_err)?;

    // Release the slot unless some other active booking still references
    // it. The partial unique index makes that impossible today; the guard
    // keeps the release correct even if that invariant is ever relaxed.
    sqlx::query(
        r#"
        UPDATE time_slots
        SET status = 'free', hold_expires_at = NULL
        WHERE id = $1
          AND status IN ('held', 'booked')
          AND NOT EXISTS (
              SELECT 1 FROM bookings
              WHERE time_slot_id = $1 AND status <> 'cancelled'
          )
        "#,
    )
    .bind(booking.time_slot_id)
    .execute(&mut *tx)
    .await
    .map_err(db_err)?;

    tx.commit().await.map_err(db_err)?;

    tracing::debug!("Cancelled booking {}", booking_id);
    Ok(cancelled)
}

pub async fn get_booking_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbBooking>> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, customer_id, provider_id, time_slot_id, status, notes,
               created_at, cancelled_at
        FROM bookings
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(booking)
}

pub async fn list_bookings_by_customer(
    pool: &Pool<Postgres>,
    customer_id: Uuid,
    status: Option<&str>,
) -> Result<Vec<DbBooking>> {
    let bookings = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, customer_id, provider_id, time_slot_id, status, notes,
               created_at, cancelled_at
        FROM bookings
        WHERE customer_id = $1 AND ($2::TEXT IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(customer_id)
    .bind(status)
    .fetch_all(pool)
    .await?;

    Ok(bookings)
}

/// Compare-and-set on the slot row. Zero rows means somebody else owns the
/// slot (or it never existed); the follow-up read disambiguates.
async fn claim_slot(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
    now: DateTime<Utc>,
    next_status: &str,
    hold_expires_at: Option<DateTime<Utc>>,
) -> BookingResult<()> {
    let claimed = sqlx::query_scalar::<_, Uuid>(CLAIM_SLOT_SQL)
        .bind(slot_id)
        .bind(now)
        .bind(next_status)
        .bind(hold_expires_at)
        .fetch_optional(&mut **tx)
        .await
        .map_err(db_err)?;

    if claimed.is_some() {
        return Ok(());
    }

    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM time_slots WHERE id = $1)")
            .bind(slot_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(db_err)?;

    Err(if exists {
        BookingError::SlotUnavailable(slot_id)
    } else {
        BookingError::SlotNotFound(slot_id)
    })
}

/// An expired hold leaves a pending booking behind; cancel it before the
/// new claim inserts its own so the partial unique index never trips.
async fn supersede_stale_hold(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
    now: DateTime<Utc>,
) -> BookingResult<()> {
    sqlx::query(
        r#"
        UPDATE bookings
        SET status = 'cancelled', cancelled_at = $2
        WHERE time_slot_id = $1 AND status = 'pending'
        "#,
    )
    .bind(slot_id)
    .bind(now)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;

    Ok(())
}

async fn insert_booking(
    tx: &mut Transaction<'_, Postgres>,
    slot_id: Uuid,
    customer_id: Uuid,
    notes: Option<&str>,
    status: &str,
    now: DateTime<Utc>,
) -> BookingResult<DbBooking> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        INSERT INTO bookings (id, customer_id, provider_id, time_slot_id, status, notes, created_at)
        SELECT $1, $2, provider_id, $3, $4, $5, $6
        FROM time_slots
        WHERE id = $3
        RETURNING id, customer_id, provider_id, time_slot_id, status, notes,
                  created_at, cancelled_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(customer_id)
    .bind(slot_id)
    .bind(status)
    .bind(notes)
    .bind(now)
    .fetch_one(&mut **tx)
    .await
    .map_err(db_err)?;

    Ok(booking)
}

async fn lock_booking(
    tx: &mut Transaction<'_, Postgres>,
    booking_id: Uuid,
) -> BookingResult<DbBooking> {
    let booking = sqlx::query_as::<_, DbBooking>(
        r#"
        SELECT id, customer_id, provider_id, time_slot_id, status, notes,
               created_at, cancelled_at
        FROM bookings
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(booking_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(db_err)?;

    booking.ok_or(BookingError::BookingNotFound(booking_id))
}
