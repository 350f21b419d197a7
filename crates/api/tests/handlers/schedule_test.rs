use chrono::NaiveDate;
use mockall::predicate;
use pretty_assertions::assert_eq;
use slotbook_core::{
    errors::BookingError,
    models::schedule::{CreateWindowRequest, GenerateSlotsRequest, GenerateSlotsResponse},
    slots,
};
use slotbook_db::models::DbScheduleWindow;
use uuid::Uuid;

use crate::test_utils::{db_window, TestContext};
use slotbook_api::middleware::error_handling::AppError;

// Test wrappers that exercise the handler logic against mock repositories

async fn test_create_window_wrapper(
    ctx: &mut TestContext,
    payload: CreateWindowRequest,
) -> Result<DbScheduleWindow, AppError> {
    // Reject a bad rule before anything is persisted
    slots::validate_window_rule(
        payload.day_of_week,
        payload.start_time,
        payload.end_time,
        payload.slot_duration_minutes,
        &payload.timezone,
    )?;

    // Create static str for mockall
    let timezone: &'static str = Box::leak(payload.timezone.clone().into_boxed_str());

    let window = ctx
        .window_repo
        .create_window(
            payload.provider_id,
            payload.day_of_week as i16,
            payload.start_time,
            payload.end_time,
            payload.slot_duration_minutes,
            timezone,
        )
        .await?;

    Ok(window)
}

async fn test_generate_wrapper(
    ctx: &mut TestContext,
    payload: GenerateSlotsRequest,
    max_generation_days: i64,
) -> Result<GenerateSlotsResponse, AppError> {
    if payload.from >= payload.to {
        return Err(AppError(BookingError::Validation(format!(
            "empty date range: {} is not before {}",
            payload.from, payload.to
        ))));
    }

    let days = (payload.to - payload.from).num_days();
    if days > max_generation_days {
        return Err(AppError(BookingError::RangeTooLarge {
            days,
            max_days: max_generation_days,
        }));
    }

    let windows = ctx
        .window_repo
        .list_windows_by_provider(payload.provider_id, true)
        .await?;

    if windows.is_empty() {
        return Err(AppError(BookingError::NotFound(format!(
            "No active schedule windows for provider {}",
            payload.provider_id
        ))));
    }

    let mut slots_created = 0;
    for window in &windows {
        let intervals = slots::expand_window(&window.to_window(), payload.from, payload.to)?;
        slots_created += ctx
            .time_slot_repo
            .insert_slots(window.provider_id, window.id, intervals)
            .await?;
    }

    Ok(GenerateSlotsResponse {
        slots_created,
        from: payload.from,
        to: payload.to,
    })
}

fn create_request(day_of_week: u8, duration: i32, timezone: &str) -> CreateWindowRequest {
    CreateWindowRequest {
        provider_id: Uuid::new_v4(),
        day_of_week,
        start_time: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time: chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        slot_duration_minutes: duration,
        timezone: timezone.to_string(),
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_create_window_success() {
    let mut ctx = TestContext::new();
    let request = create_request(0, 30, "UTC");
    let provider_id = request.provider_id;
    let window = db_window(provider_id, 0, "09:00", "12:00", 30);

    ctx.window_repo
        .expect_create_window()
        .times(1)
        .returning(move |_, _, _, _, _, _| Ok(window.clone()));

    let result = test_create_window_wrapper(&mut ctx, request)
        .await
        .expect("create window should succeed");

    assert_eq!(result.provider_id, provider_id);
    assert_eq!(result.day_of_week, 0);
    assert!(result.is_active);
}

#[tokio::test]
async fn test_create_window_rejects_bad_duration() {
    // No repository expectation: validation must fail before any write
    let mut ctx = TestContext::new();
    let request = create_request(0, 0, "UTC");

    let result = test_create_window_wrapper(&mut ctx, request).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::InvalidWindow(_)))
    ));
}

#[tokio::test]
async fn test_create_window_rejects_unknown_timezone() {
    let mut ctx = TestContext::new();
    let request = create_request(0, 30, "Atlantis/Sunken_City");

    let result = test_create_window_wrapper(&mut ctx, request).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::InvalidWindow(_)))
    ));
}

#[tokio::test]
async fn test_generate_rejects_oversized_range() {
    let mut ctx = TestContext::new();
    let request = GenerateSlotsRequest {
        provider_id: Uuid::new_v4(),
        from: date(2025, 1, 6),
        to: date(2025, 6, 6),
    };

    let result = test_generate_wrapper(&mut ctx, request, 90).await;

    assert!(matches!(
        result,
        Err(AppError(BookingError::RangeTooLarge { days: 151, max_days: 90 }))
    ));
}

#[tokio::test]
async fn test_generate_rejects_empty_range() {
    let mut ctx = TestContext::new();
    let request = GenerateSlotsRequest {
        provider_id: Uuid::new_v4(),
        from: date(2025, 1, 6),
        to: date(2025, 1, 6),
    };

    let result = test_generate_wrapper(&mut ctx, request, 90).await;

    assert!(matches!(result, Err(AppError(BookingError::Validation(_)))));
}

#[tokio::test]
async fn test_generate_without_windows() {
    let mut ctx = TestContext::new();
    let provider_id = Uuid::new_v4();

    ctx.window_repo
        .expect_list_windows_by_provider()
        .with(predicate::eq(provider_id), predicate::eq(true))
        .times(1)
        .returning(|_, _| Ok(Vec::new()));

    let request = GenerateSlotsRequest {
        provider_id,
        from: date(2025, 1, 6),
        to: date(2025, 1, 13),
    };

    let result = test_generate_wrapper(&mut ctx, request, 90).await;

    assert!(matches!(result, Err(AppError(BookingError::NotFound(_)))));
}

#[tokio::test]
async fn test_generate_materializes_expanded_intervals() {
    let mut ctx = TestContext::new();
    let provider_id = Uuid::new_v4();
    let window = db_window(provider_id, 0, "09:00", "12:00", 30);
    let window_id = window.id;

    ctx.window_repo
        .expect_list_windows_by_provider()
        .times(1)
        .returning(move |_, _| Ok(vec![window.clone()]));

    // One Monday at 30 minute steps over 09:00-12:00 yields six intervals
    ctx.time_slot_repo
        .expect_insert_slots()
        .withf(move |provider, window, intervals| {
            *provider == provider_id && *window == window_id && intervals.len() == 6
        })
        .times(1)
        .returning(|_, _, intervals| Ok(intervals.len() as u64));

    let request = GenerateSlotsRequest {
        provider_id,
        from: date(2025, 1, 6),
        to: date(2025, 1, 7),
    };

    let response = test_generate_wrapper(&mut ctx, request, 90)
        .await
        .expect("generation should succeed");

    assert_eq!(response.slots_created, 6);
}

#[tokio::test]
async fn test_generate_rerun_creates_nothing_new() {
    let mut ctx = TestContext::new();
    let provider_id = Uuid::new_v4();
    let window = db_window(provider_id, 0, "09:00", "12:00", 30);

    ctx.window_repo
        .expect_list_windows_by_provider()
        .times(1)
        .returning(move |_, _| Ok(vec![window.clone()]));

    // Every interval already has a slot; the upsert inserts none and
    // touches no existing status
    ctx.time_slot_repo
        .expect_insert_slots()
        .times(1)
        .returning(|_, _, _| Ok(0));

    let request = GenerateSlotsRequest {
        provider_id,
        from: date(2025, 1, 6),
        to: date(2025, 1, 7),
    };

    let response = test_generate_wrapper(&mut ctx, request, 90)
        .await
        .expect("re-generation should succeed");

    assert_eq!(response.slots_created, 0);
}

#[tokio::test]
async fn test_block_booked_slot_is_rejected() {
    let mut ctx = TestContext::new();
    let slot_id = Uuid::new_v4();

    ctx.time_slot_repo
        .expect_block_slot()
        .with(predicate::eq(slot_id))
        .times(1)
        .returning(|_| {
            Err(BookingError::Validation(
                "cannot block a booked time slot".to_string(),
            ))
        });

    let result = ctx.time_slot_repo.block_slot(slot_id).await;

    assert!(matches!(result, Err(BookingError::Validation(_))));
}
