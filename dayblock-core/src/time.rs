//! Time utilities: timezone-aware day windows and cursor rounding.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Parse an IANA timezone name like "America/New_York".
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

/// No zone skips more than this many minutes at a transition.
const MAX_GAP_MINUTES: i64 = 180;

/// Wall-clock `hour:minute` on `day` in `tz`.
///
/// Ambiguous times resolve to the earlier instant; times inside a DST gap move
/// forward to the first valid minute after it.
pub fn at_local(day: NaiveDate, hour: u32, minute: u32, tz: Tz) -> DateTime<Tz> {
    let time = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN);
    let ndt = day.and_time(time);
    (0..=MAX_GAP_MINUTES)
        .find_map(|m| tz.from_local_datetime(&(ndt + Duration::minutes(m))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&ndt))
}

/// Same as [`at_local`] for an arbitrary wall-clock time.
pub fn at_local_time(day: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<Tz> {
    at_local(day, time.hour(), time.minute(), tz)
}

/// The admissible scheduling day, static per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWindow {
    pub start_hour: u32,
    /// New same-day commitments at or past this hour need an explicit override.
    pub cutoff_hour: u32,
}

impl Default for ScheduleWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            cutoff_hour: 23,
        }
    }
}

impl ScheduleWindow {
    pub fn start_on(&self, day: NaiveDate, tz: Tz) -> DateTime<Tz> {
        at_local(day, self.start_hour, 0, tz)
    }

    pub fn cutoff_on(&self, day: NaiveDate, tz: Tz) -> DateTime<Tz> {
        at_local(day, self.cutoff_hour, 0, tz)
    }
}

/// Round up to the next half-hour boundary, dropping seconds.
pub fn ceil_to_half_hour(dt: DateTime<Tz>) -> DateTime<Tz> {
    let truncated = dt
        - Duration::seconds(dt.second().into())
        - Duration::nanoseconds(dt.nanosecond().into());
    let on_boundary = dt.second() == 0 && dt.nanosecond() == 0;
    match truncated.minute() % 30 {
        0 if on_boundary => truncated,
        r => truncated + Duration::minutes((30 - r).into()),
    }
}

/// Where the cursor starts for a session targeting `day`.
///
/// Today (or a past day): now rounded up to the half hour, but never before
/// the window opens. A future day: that day's window start.
pub fn session_start(now: DateTime<Utc>, day: NaiveDate, tz: Tz, window: &ScheduleWindow) -> DateTime<Utc> {
    let local_now = now.with_timezone(&tz);
    let opens = window.start_on(day, tz);
    if day <= local_now.date_naive() {
        ceil_to_half_hour(local_now).max(opens).with_timezone(&Utc)
    } else {
        opens.with_timezone(&Utc)
    }
}

/// Local calendar day of `now` in `tz`.
pub fn local_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ny() -> Tz {
        parse_tz("America/New_York").unwrap()
    }

    #[test]
    fn rejects_unknown_timezone() {
        assert!(parse_tz("Mars/Olympus").is_err());
    }

    #[test]
    fn half_hour_rounding() {
        let tz = ny();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let t = at_local(day, 10, 7, tz);
        assert_eq!(ceil_to_half_hour(t), at_local(day, 10, 30, tz));

        let t = at_local(day, 10, 45, tz);
        assert_eq!(ceil_to_half_hour(t), at_local(day, 11, 0, tz));

        let exact = at_local(day, 10, 30, tz);
        assert_eq!(ceil_to_half_hour(exact), exact);
    }

    #[test]
    fn session_start_never_precedes_window() {
        let tz = ny();
        let w = ScheduleWindow::default();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        let early = at_local(day, 6, 10, tz).with_timezone(&Utc);
        assert_eq!(session_start(early, day, tz, &w), at_local(day, 9, 0, tz).with_timezone(&Utc));

        let midday = at_local(day, 13, 5, tz).with_timezone(&Utc);
        assert_eq!(session_start(midday, day, tz, &w), at_local(day, 13, 30, tz).with_timezone(&Utc));

        let tomorrow = day.succ_opt().unwrap();
        assert_eq!(
            session_start(midday, tomorrow, tz, &w),
            at_local(tomorrow, 9, 0, tz).with_timezone(&Utc)
        );
    }

    #[test]
    fn spring_forward_gap_moves_past_the_gap() {
        let tz = ny();
        let day = NaiveDate::from_ymd_opt(2026, 3, 8).unwrap();
        let in_gap = at_local(day, 2, 30, tz);
        assert_eq!(in_gap.date_naive(), day);
        assert_eq!((in_gap.hour(), in_gap.minute()), (3, 0));
        assert!(in_gap >= at_local(day, 3, 0, tz));
        assert!(in_gap < at_local(day, 3, 1, tz));

        let t = at_local_time(day, NaiveTime::from_hms_opt(2, 10, 0).unwrap(), tz);
        assert_eq!(t, at_local(day, 3, 0, tz));
    }

    #[test]
    fn fall_back_overlap_takes_the_earlier_instant() {
        let tz = ny();
        let day = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let t = at_local(day, 1, 30, tz);
        assert_eq!(t.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap());
    }
}
