//! Recurring-window expansion into discrete bookable intervals.
//!
//! A [`ScheduleWindow`] describes wall-clock availability (for example
//! "Mondays 09:00-12:00 in Europe/Berlin, 30 minute slots"). Expansion
//! walks every matching calendar date in `[from, to)`, steps through the
//! window in wall-clock time, and resolves each boundary to UTC through
//! the window's IANA timezone.
//!
//! Daylight-saving handling: interval boundaries are wall-clock-constant,
//! so the absolute duration of a slot that straddles a transition shifts
//! by the offset change. An ambiguous local time (fall-back) resolves to
//! the earliest offset; a slot with a boundary inside a spring-forward
//! gap does not exist on that day and is skipped.
//!
//! The expansion is a pure function of its inputs and carries no iterator
//! state, so re-running it over an overlapping range yields the same
//! intervals and upstream persistence stays idempotent.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{BookingError, BookingResult};
use crate::models::schedule::ScheduleWindow;

/// One absolute `[start_at, end_at)` interval produced by expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotInterval {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

/// Validate the recurring rule itself, independent of any date range.
///
/// Returns the parsed timezone so callers resolve it exactly once.
pub fn validate_window_rule(
    day_of_week: u8,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_duration_minutes: i32,
    timezone: &str,
) -> BookingResult<Tz> {
    if day_of_week > 6 {
        return Err(BookingError::InvalidWindow(format!(
            "day_of_week must be 0..=6 (Monday = 0), got {day_of_week}"
        )));
    }
    if slot_duration_minutes <= 0 {
        return Err(BookingError::InvalidWindow(format!(
            "slot_duration_minutes must be positive, got {slot_duration_minutes}"
        )));
    }
    if start_time >= end_time {
        return Err(BookingError::InvalidWindow(format!(
            "start_time {start_time} must be before end_time {end_time}"
        )));
    }
    timezone
        .parse::<Tz>()
        .map_err(|_| BookingError::InvalidWindow(format!("unknown timezone: {timezone}")))
}

/// Expand a window into the discrete intervals it covers over `[from, to)`.
///
/// `from` is inclusive, `to` exclusive. A trailing slot whose wall-clock
/// end would exceed the window's `end_time` is dropped, not truncated.
pub fn expand_window(
    window: &ScheduleWindow,
    from: NaiveDate,
    to: NaiveDate,
) -> BookingResult<Vec<SlotInterval>> {
    let tz = validate_window_rule(
        window.day_of_week,
        window.start_time,
        window.end_time,
        window.slot_duration_minutes,
        &window.timezone,
    )?;
    if from >= to {
        return Err(BookingError::Validation(format!(
            "empty date range: {from} is not before {to}"
        )));
    }

    let step = Duration::minutes(i64::from(window.slot_duration_minutes));
    let mut intervals = Vec::new();

    let mut date = from;
    while date < to {
        if date.weekday().num_days_from_monday() as u8 == window.day_of_week {
            expand_day(&tz, date, window.start_time, window.end_time, step, &mut intervals);
        }
        date = date
            .succ_opt()
            .ok_or_else(|| BookingError::Validation(format!("date overflow after {date}")))?;
    }

    Ok(intervals)
}

fn expand_day(
    tz: &Tz,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    step: Duration,
    out: &mut Vec<SlotInterval>,
) {
    let day_end = date.and_time(end_time);
    let mut cursor = date.and_time(start_time);

    while cursor + step <= day_end {
        if let (Some(start_at), Some(end_at)) =
            (resolve_local(tz, cursor), resolve_local(tz, cursor + step))
        {
            out.push(SlotInterval { start_at, end_at });
        }
        cursor += step;
    }
}

fn resolve_local(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(resolved) => Some(resolved.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}
