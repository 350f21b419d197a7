use crate::models::DbScheduleWindow;
use chrono::{NaiveTime, Utc};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Upsert a weekly window. A provider has at most one window per weekday,
/// so re-defining a weekday replaces the rule and re-activates it.
pub async fn create_window(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_duration_minutes: i32,
    timezone: &str,
) -> Result<DbScheduleWindow> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    tracing::debug!(
        "Defining window: provider={}, day_of_week={}, {}-{} every {}m ({})",
        provider_id,
        day_of_week,
        start_time,
        end_time,
        slot_duration_minutes,
        timezone
    );

    let window = sqlx::query_as::<_, DbScheduleWindow>(
        r#"
        INSERT INTO schedule_windows
            (id, provider_id, day_of_week, start_time, end_time,
             slot_duration_minutes, timezone, is_active, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8)
        ON CONFLICT (provider_id, day_of_week) DO UPDATE SET
            start_time = EXCLUDED.start_time,
            end_time = EXCLUDED.end_time,
            slot_duration_minutes = EXCLUDED.slot_duration_minutes,
            timezone = EXCLUDED.timezone,
            is_active = TRUE
        RETURNING id, provider_id, day_of_week, start_time, end_time,
                  slot_duration_minutes, timezone, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(provider_id)
    .bind(day_of_week)
    .bind(start_time)
    .bind(end_time)
    .bind(slot_duration_minutes)
    .bind(timezone)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(window)
}

pub async fn get_window_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbScheduleWindow>> {
    let window = sqlx::query_as::<_, DbScheduleWindow>(
        r#"
        SELECT id, provider_id, day_of_week, start_time, end_time,
               slot_duration_minutes, timezone, is_active, created_at
        FROM schedule_windows
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(window)
}

pub async fn list_windows_by_provider(
    pool: &Pool<Postgres>,
    provider_id: Uuid,
    active_only: bool,
) -> Result<Vec<DbScheduleWindow>> {
    let windows = sqlx::query_as::<_, DbScheduleWindow>(
        r#"
        SELECT id, provider_id, day_of_week, start_time, end_time,
               slot_duration_minutes, timezone, is_active, created_at
        FROM schedule_windows
        WHERE provider_id = $1 AND (NOT $2 OR is_active)
        ORDER BY day_of_week ASC, start_time ASC
        "#,
    )
    .bind(provider_id)
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    Ok(windows)
}

/// Soft-deactivate. The window row stays behind because materialized slots
/// reference it; generation simply stops picking it up.
pub async fn deactivate_window(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbScheduleWindow>> {
    let window = sqlx::query_as::<_, DbScheduleWindow>(
        r#"
        UPDATE schedule_windows
        SET is_active = FALSE
        WHERE id = $1
        RETURNING id, provider_id, day_of_week, start_time, end_time,
                  slot_duration_minutes, timezone, is_active, created_at
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(window)
}
