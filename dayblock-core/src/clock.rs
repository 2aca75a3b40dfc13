//! Free-form clock and day expressions typed by the operator.

use anyhow::{anyhow, bail, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

/// Parse `15`, `3pm`, `3:30pm`, `15:30`, `1530` or `9a`.
///
/// Bare hours without a suffix are read on the 24-hour clock.
pub fn parse_clock(input: &str) -> Result<NaiveTime> {
    let input = input.trim();
    let clock_re = Regex::new(r"(?i)^(?P<h>\d{1,2})(?::?(?P<m>\d{2}))?\s*(?P<ampm>am|pm|a|p)?$")?;
    let caps = clock_re
        .captures(input)
        .ok_or_else(|| anyhow!("not a clock time: {input:?}"))?;

    let mut hour: u32 = caps["h"].parse()?;
    let minute: u32 = match caps.name("m") {
        Some(m) => m.as_str().parse()?,
        None => 0,
    };

    if let Some(suffix) = caps.name("ampm") {
        if !(1..=12).contains(&hour) {
            bail!("hour out of range for 12-hour clock: {input:?}");
        }
        let pm = suffix.as_str().to_lowercase().starts_with('p');
        hour = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow!("time out of range: {input:?}"))
}

fn parse_weekday(input: &str) -> Option<Weekday> {
    match input {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a target day relative to `today`.
///
/// Accepts `today`, `tomorrow`, a weekday name (the next such day strictly
/// after today), an ISO date, or a month-day pair like `March 3` / `Mar 3`
/// (rolled into next year when it has already passed).
pub fn parse_day(input: &str, today: NaiveDate) -> Result<NaiveDate> {
    let normalized = input.trim().to_lowercase();
    match normalized.as_str() {
        "" => bail!("empty date"),
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        _ => {}
    }

    if let Some(target) = parse_weekday(&normalized) {
        let ahead = (target.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
        let ahead = if ahead == 0 { 7 } else { ahead };
        return Ok(today + Duration::days(ahead.into()));
    }

    if let Ok(d) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return Ok(d);
    }

    let with_year = format!("{} {}", input.trim(), today.year());
    let parsed = NaiveDate::parse_from_str(&with_year, "%B %d %Y")
        .or_else(|_| NaiveDate::parse_from_str(&with_year, "%b %d %Y"))
        .map_err(|_| anyhow!("unrecognized date: {input:?}"))?;
    if parsed >= today {
        return Ok(parsed);
    }
    parsed
        .with_year(today.year() + 1)
        .ok_or_else(|| anyhow!("no such date next year: {input:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn clock_forms() {
        assert_eq!(parse_clock("15").unwrap(), t(15, 0));
        assert_eq!(parse_clock("3pm").unwrap(), t(15, 0));
        assert_eq!(parse_clock("3:30 PM").unwrap(), t(15, 30));
        assert_eq!(parse_clock("15:30").unwrap(), t(15, 30));
        assert_eq!(parse_clock("1530").unwrap(), t(15, 30));
        assert_eq!(parse_clock("9a").unwrap(), t(9, 0));
        assert_eq!(parse_clock("12am").unwrap(), t(0, 0));
        assert_eq!(parse_clock("12pm").unwrap(), t(12, 0));
    }

    #[test]
    fn clock_rejects_garbage() {
        assert!(parse_clock("soon").is_err());
        assert!(parse_clock("25").is_err());
        assert!(parse_clock("13pm").is_err());
        assert!(parse_clock("10:75").is_err());
        assert!(parse_clock("").is_err());
    }

    #[test]
    fn weekday_is_strictly_after_today() {
        // 2026-03-02 is a Monday.
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(parse_day("wednesday", monday).unwrap(), NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
        assert_eq!(parse_day("Monday", monday).unwrap(), NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
    }

    #[test]
    fn month_day_rolls_into_next_year() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(parse_day("March 3", today).unwrap(), NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert_eq!(parse_day("Mar 2", today).unwrap(), today);
        assert_eq!(parse_day("February 1", today).unwrap(), NaiveDate::from_ymd_opt(2027, 2, 1).unwrap());
    }

    #[test]
    fn relative_and_iso_days() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(parse_day("tomorrow", today).unwrap(), NaiveDate::from_ymd_opt(2026, 3, 3).unwrap());
        assert_eq!(parse_day("2026-04-01", today).unwrap(), NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert!(parse_day("someday soon", today).is_err());
    }
}
