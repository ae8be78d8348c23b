//! Schedule evaluation.
//!
//! Pure functions deciding whether a point in time falls inside the
//! configured weekly active window, and when the next window opens.
//! Evaluation never fails: a malformed time string simply makes that day
//! inactive, so a hand-edited settings file cannot take the app down.

use crate::settings::{WeeklySchedule, DAY_NAMES};
use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("day index must be 0-6, got {0}")]
    DayIndexOutOfRange(usize),
}

/// Parses a lenient 24-hour "HH:MM" string.
///
/// Strict zero-padding is enforced at the configuration boundary; here we
/// accept anything `u32`-parseable so stored values like "8:00" still
/// evaluate.
fn parse_time(value: &str) -> Option<NaiveTime> {
    let (hour, minute) = value.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Checks whether `current` lies in the window `[start, stop]`, both ends
/// inclusive. A window with `start > stop` wraps past midnight: it covers
/// `current >= start` on the evening side and `current <= stop` on the
/// morning side.
fn time_in_range(current: NaiveTime, start: NaiveTime, stop: NaiveTime) -> bool {
    if start <= stop {
        start <= current && current <= stop
    } else {
        current >= start || current <= stop
    }
}

/// Returns true when `now` falls inside the active window of its weekday.
///
/// A disabled day or a day with an unparseable start or stop time is never
/// within schedule.
pub fn is_within_schedule(schedule: &WeeklySchedule, now: NaiveDateTime) -> bool {
    let day_index = now.weekday().num_days_from_monday() as usize;
    let Some(day) = schedule.day(day_index) else {
        return false;
    };

    if !day.enabled {
        return false;
    }

    let (Some(start), Some(stop)) = (parse_time(&day.start_time), parse_time(&day.stop_time))
    else {
        return false;
    };

    time_in_range(now.time(), start, stop)
}

/// Returns the next instant at which the schedule is active.
///
/// If `now` is already inside today's window (including the wrapped
/// morning side of an overnight window), `now` itself is returned.
/// Otherwise the start instant of the first enabled day is computed,
/// scanning today first and wrapping past Sunday back to Monday. Days
/// whose times fail to parse are skipped. Returns `None` when no day is
/// enabled.
pub fn next_active_instant(
    schedule: &WeeklySchedule,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    let today = now.weekday().num_days_from_monday() as usize;

    for offset in 0..7 {
        let day_index = (today + offset) % 7;
        let Some(day) = schedule.day(day_index) else {
            continue;
        };

        if !day.enabled {
            continue;
        }

        let Some(start) = parse_time(&day.start_time) else {
            continue;
        };

        let target = (now.date() + Duration::days(offset as i64)).and_time(start);

        if offset == 0 {
            if let Some(stop) = parse_time(&day.stop_time) {
                if time_in_range(now.time(), start, stop) {
                    return Some(now);
                }
            }
            if target <= now {
                // Today's window is over; keep scanning later days.
                continue;
            }
        }

        return Some(target);
    }

    None
}

/// Returns the English name of a day by index (0 = Monday .. 6 = Sunday).
pub fn day_name(day_index: usize) -> Result<&'static str, ScheduleError> {
    DAY_NAMES
        .get(day_index)
        .copied()
        .ok_or(ScheduleError::DayIndexOutOfRange(day_index))
}
