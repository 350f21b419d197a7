use chrono::Utc;
use mockall::predicate;
use pretty_assertions::assert_eq;
use slotbook_core::errors::BookingError;
use slotbook_db::models::DbBooking;
use uuid::Uuid;

use crate::test_utils::{db_booking, TestContext};
use slotbook_api::middleware::error_handling::AppError;

// Test wrappers that exercise the handler logic against mock repositories

async fn test_reserve_wrapper(
    ctx: &mut TestContext,
    slot_id: Uuid,
    customer_id: Uuid,
) -> Result<DbBooking, AppError> {
    let booking = ctx
        .booking_repo
        .reserve(slot_id, customer_id, None, Utc::now())
        .await?;

    Ok(booking)
}

async fn test_cancel_wrapper(ctx: &mut TestContext, booking_id: Uuid) -> Result<DbBooking, AppError> {
    let booking = ctx.booking_repo.cancel(booking_id, Utc::now()).await?;

    Ok(booking)
}

async fn test_get_booking_wrapper(
    ctx: &mut TestContext,
    booking_id: Uuid,
) -> Result<DbBooking, AppError> {
    let booking = ctx
        .booking_repo
        .get_booking_by_id(booking_id)
        .await?
        .ok_or(BookingError::BookingNotFound(booking_id))?;

    Ok(booking)
}

#[tokio::test]
async fn test_reserve_success() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();
    let customer_id = Uuid::new_v4();
    let booking = db_booking("confirmed", slot_id, customer_id);

    ctx.booking_repo
        .expect_reserve()
        .with(
            predicate::eq(slot_id),
            predicate::eq(customer_id),
            predicate::always(),
            predicate::always(),
        )
        .times(1)
        .returning(move |_, _, _, _| Ok(booking.clone()));

    let result = test_reserve_wrapper(&mut ctx, slot_id, customer_id)
        .await
        .expect("reserve should succeed");

    assert_eq!(result.time_slot_id, slot_id);
    assert_eq!(result.customer_id, customer_id);
    assert_eq!(result.status, "confirmed");
}

#[tokio::test]
async fn test_reserve_race_has_a_single_winner() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();
    let winner = Uuid::new_v4();
    let loser = Uuid::new_v4();

    // The first compare-and-set wins; the competitor observes the slot
    // as taken and fails cleanly.
    let claims = std::sync::atomic::AtomicUsize::new(0);
    ctx.booking_repo
        .expect_reserve()
        .times(2)
        .returning(move |slot_id, customer_id, _, _| {
            if claims.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                Ok(db_booking("confirmed", slot_id, customer_id))
            } else {
                Err(BookingError::SlotUnavailable(slot_id))
            }
        });

    let first = test_reserve_wrapper(&mut ctx, slot_id, winner).await;
    let second = test_reserve_wrapper(&mut ctx, slot_id, loser).await;

    assert!(first.is_ok());
    assert!(matches!(
        second,
        Err(AppError(BookingError::SlotUnavailable(id))) if id == slot_id
    ));
}

#[tokio::test]
async fn test_reserve_unknown_slot() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_reserve()
        .times(1)
        .returning(move |slot_id, _, _, _| Err(BookingError::SlotNotFound(slot_id)));

    let result = test_reserve_wrapper(&mut ctx, slot_id, Uuid::new_v4()).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::SlotNotFound(id))) if id == slot_id
    ));
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();
    let booking = db_booking("cancelled", slot_id, Uuid::new_v4());
    let booking_id = booking.id;

    // The second cancel is a no-op success, not an error
    ctx.booking_repo
        .expect_cancel()
        .with(predicate::eq(booking_id), predicate::always())
        .times(2)
        .returning(move |_, _| Ok(booking.clone()));

    let first = test_cancel_wrapper(&mut ctx, booking_id)
        .await
        .expect("first cancel should succeed");
    let second = test_cancel_wrapper(&mut ctx, booking_id)
        .await
        .expect("repeated cancel should succeed");

    assert_eq!(first.status, "cancelled");
    assert_eq!(second.status, "cancelled");
}

#[tokio::test]
async fn test_cancel_unknown_booking() {
    let mut ctx = TestContext::new();
    let booking_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_cancel()
        .times(1)
        .returning(move |booking_id, _| Err(BookingError::BookingNotFound(booking_id)));

    let result = test_cancel_wrapper(&mut ctx, booking_id).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::BookingNotFound(id))) if id == booking_id
    ));
}

#[tokio::test]
async fn test_confirm_after_hold_lapsed() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();
    let booking_id = Uuid::new_v4();

    // Confirming an expired hold releases the claim and reports conflict
    ctx.booking_repo
        .expect_confirm()
        .with(predicate::eq(booking_id), predicate::always())
        .times(1)
        .returning(move |_, _| Err(BookingError::SlotUnavailable(slot_id)));

    let result = ctx.booking_repo.confirm(booking_id, Utc::now()).await;

    assert!(matches!(
        result,
        Err(BookingError::SlotUnavailable(id)) if id == slot_id
    ));
}

#[tokio::test]
async fn test_confirm_pending_booking() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();
    let customer_id = Uuid::new_v4();
    let booking = db_booking("confirmed", slot_id, customer_id);
    let booking_id = booking.id;

    ctx.booking_repo
        .expect_confirm()
        .times(1)
        .returning(move |_, _| Ok(booking.clone()));

    let result = ctx
        .booking_repo
        .confirm(booking_id, Utc::now())
        .await
        .expect("confirm should succeed");

    assert_eq!(result.status, "confirmed");
    assert_eq!(result.time_slot_id, slot_id);
}

#[tokio::test]
async fn test_get_booking_not_found() {
    let mut ctx = TestContext::new();
    let booking_id = Uuid::new_v4();

    ctx.booking_repo
        .expect_get_booking_by_id()
        .with(predicate::eq(booking_id))
        .times(1)
        .returning(|_| Ok(None));

    let result = test_get_booking_wrapper(&mut ctx, booking_id).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::BookingNotFound(id))) if id == booking_id
    ));
}

#[tokio::test]
async fn test_list_customer_bookings_newest_first() {
    let mut ctx = TestContext::new();
    let customer_id = Uuid::new_v4();

    let older = db_booking("cancelled", Uuid::new_v4(), customer_id);
    let newer = db_booking("confirmed", Uuid::new_v4(), customer_id);
    let expected = vec![newer.clone(), older.clone()];

    ctx.booking_repo
        .expect_list_bookings_by_customer()
        .with(predicate::eq(customer_id), predicate::eq(None::<&'static str>))
        .times(1)
        .returning(move |_, _| Ok(expected.clone()));

    let bookings = ctx
        .booking_repo
        .list_bookings_by_customer(customer_id, None)
        .await
        .expect("listing should succeed");

    assert_eq!(bookings.len(), 2);
    assert_eq!(bookings[0].id, newer.id);
    assert_eq!(bookings[1].id, older.id);
}
