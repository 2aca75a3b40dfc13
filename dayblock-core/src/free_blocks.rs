//! Free-block calculator: the complement of the busy schedule within a day.
//!
//! Used for the pre-flight "is there any room left today" report only; the
//! scheduler itself never searches for free slots.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::overlap::Interval;
use crate::schedule::Schedule;
use crate::time::ScheduleWindow;

/// Open intervals of `day`, clipped to `[max(window start, now), window end]`.
///
/// Sweep-line over busy blocks sorted by (clipped) start.
pub fn free_blocks(
    schedule: &Schedule,
    window: &ScheduleWindow,
    day: NaiveDate,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<Interval> {
    let day_start = window.start_on(day, tz).with_timezone(&Utc);
    let day_end = window.cutoff_on(day, tz).with_timezone(&Utc);
    let current = day_start.max(now);
    if current >= day_end {
        return Vec::new();
    }

    let mut busy: Vec<Interval> = schedule
        .busy()
        .into_iter()
        .filter(|b| b.end > current)
        .map(|b| Interval::new(b.start.max(current), b.end))
        .collect();
    busy.sort_by_key(|b| b.start);

    let mut cursor = current;
    let mut free = Vec::new();
    for b in busy {
        if b.start >= day_end {
            break;
        }
        if cursor < b.start {
            free.push(Interval::new(cursor, b.start));
        }
        cursor = cursor.max(b.end);
    }
    if cursor < day_end {
        free.push(Interval::new(cursor, day_end));
    }
    free
}

pub fn total_free(blocks: &[Interval]) -> Duration {
    blocks
        .iter()
        .map(Interval::length)
        .fold(Duration::zero(), |acc, d| acc + d)
}
