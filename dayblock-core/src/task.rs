//! Task model mirrored from the external task store.
//!
//! The store owns identity and lifecycle; the planner only ever holds snapshots
//! and issues property patches against them.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::overlap::Interval;

/// Display name used when the store hands back a task without a title.
pub const UNNAMED_TASK: &str = "Unnamed Task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Unassigned,
    Someday,
    Low,
    Medium,
    High,
    MustBeDoneToday,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Unassigned => "Unassigned",
            Priority::Someday => "Someday",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::MustBeDoneToday => "Must Be Done Today",
        }
    }

    /// High and MustBeDoneToday; everything else counts as low.
    pub fn is_high(&self) -> bool {
        matches!(self, Priority::High | Priority::MustBeDoneToday)
    }

    /// Urgency rank used for "priority ascending" ordering (0 = most urgent).
    pub fn rank(&self) -> u8 {
        match self {
            Priority::MustBeDoneToday => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
            Priority::Someday => 4,
            Priority::Unassigned => 5,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "unassigned" => Ok(Priority::Unassigned),
            "someday" => Ok(Priority::Someday),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "must be done today" | "mustbedonetoday" => Ok(Priority::MustBeDoneToday),
            other => Err(anyhow!("unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    NotStarted,
    /// Not started, and not meant to be picked up before the evening.
    NotStartedLater,
    InProgress,
    WaitingOnReply,
    WaitingOnOtherTask,
    Done,
    HandedOff,
    Deprecated,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotStarted => "Not started",
            Status::NotStartedLater => "Not started (later)",
            Status::InProgress => "In progress",
            Status::WaitingOnReply => "Waiting on Reply",
            Status::WaitingOnOtherTask => "Waiting on other task",
            Status::Done => "Done",
            Status::HandedOff => "Handed Off",
            Status::Deprecated => "Deprecated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Done | Status::HandedOff | Status::Deprecated)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "not started" => Ok(Status::NotStarted),
            "not started (later)" | "later" => Ok(Status::NotStartedLater),
            "in progress" => Ok(Status::InProgress),
            "waiting on reply" => Ok(Status::WaitingOnReply),
            "waiting on other task" => Ok(Status::WaitingOnOtherTask),
            "done" | "completed" => Ok(Status::Done),
            "handed off" => Ok(Status::HandedOff),
            "deprecated" => Ok(Status::Deprecated),
            other => Err(anyhow!("unknown status: {other}")),
        }
    }
}

/// Priority-independent sizing used by effort-based flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Low => "Low",
            Effort::Medium => "Medium",
            Effort::High => "High",
        }
    }
}

impl FromStr for Effort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Effort::Low),
            "medium" => Ok(Effort::Medium),
            "high" => Ok(Effort::High),
            other => Err(anyhow!("unknown effort: {other}")),
        }
    }
}

/// Due window as the store records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Due {
    /// Date only, no time component.
    Date(NaiveDate),
    /// Timestamped; `end` may be missing for point-in-time dues.
    Timed {
        start: DateTime<FixedOffset>,
        end: Option<DateTime<FixedOffset>>,
    },
}

impl Due {
    /// Build a full window, keeping the local offset of `tz` for write-back.
    pub fn window_in(window: Interval, tz: Tz) -> Self {
        Due::Timed {
            start: window.start.with_timezone(&tz).fixed_offset(),
            end: Some(window.end.with_timezone(&tz).fixed_offset()),
        }
    }

    /// Both ends in UTC, if this due carries a full window.
    pub fn window(&self) -> Option<Interval> {
        match self {
            Due::Timed {
                start,
                end: Some(end),
            } => Some(Interval::new(start.with_timezone(&Utc), end.with_timezone(&Utc))),
            _ => None,
        }
    }

    /// Local calendar day of the due (start side).
    pub fn date_in(&self, tz: Tz) -> NaiveDate {
        match self {
            Due::Date(d) => *d,
            Due::Timed { start, .. } => start.with_timezone(&tz).date_naive(),
        }
    }

    /// Instant the due begins; date-only dues begin at local midnight.
    pub fn start_instant(&self, tz: Tz) -> DateTime<Utc> {
        match self {
            Due::Date(d) => crate::time::at_local(*d, 0, 0, tz).with_timezone(&Utc),
            Due::Timed { start, .. } => start.with_timezone(&Utc),
        }
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, Due::Timed { end: Some(_), .. })
    }
}

/// Snapshot of a task as read from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub priority: Priority,
    pub status: Status,
    /// Independent of `status`, the store keeps its own checkbox.
    pub done: bool,
    pub due: Option<Due>,
    pub effort: Option<Effort>,
    /// True once the task holds a concrete (start, end) rather than a bare date.
    pub assigned_time: bool,
    pub class: Option<String>,
    pub created_time: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            name: if name.trim().is_empty() {
                UNNAMED_TASK.to_string()
            } else {
                name
            },
            priority: Priority::Low,
            status: Status::NotStarted,
            done: false,
            due: None,
            effort: None,
            assigned_time: false,
            class: None,
            created_time: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_effort(mut self, effort: Effort) -> Self {
        self.effort = Some(effort);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.due = Some(Due::Date(date));
        self.assigned_time = false;
        self
    }

    pub fn with_window<T: TimeZone>(mut self, start: DateTime<T>, end: DateTime<T>) -> Self {
        self.due = Some(Due::Timed {
            start: start.fixed_offset(),
            end: Some(end.fixed_offset()),
        });
        self.assigned_time = true;
        self
    }

    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created_time = Some(created);
        self
    }

    pub fn mark_done(mut self) -> Self {
        self.done = true;
        self.status = Status::Done;
        self
    }

    /// Full UTC window, when the task is time-boxed.
    pub fn window(&self) -> Option<Interval> {
        self.due.as_ref().and_then(Due::window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_names_roundtrip_through_store_spelling() {
        for p in [
            Priority::Unassigned,
            Priority::Someday,
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::MustBeDoneToday,
        ] {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn completed_is_read_as_done() {
        assert_eq!("Completed".parse::<Status>().unwrap(), Status::Done);
        assert!(Status::Deprecated.is_terminal());
        assert!(!Status::NotStartedLater.is_terminal());
    }

    #[test]
    fn blank_name_degrades_to_unnamed() {
        let t = Task::new("t1", "   ");
        assert_eq!(t.name, UNNAMED_TASK);
    }

    #[test]
    fn window_is_compared_in_utc() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let start = est.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let end = est.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let t = Task::new("t1", "focus").with_window(start, end);

        let w = t.window().unwrap();
        assert_eq!(w.start, Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap());
        assert!(t.assigned_time);
    }

    #[test]
    fn date_only_due_has_no_window() {
        let t = Task::new("t1", "errand").with_date(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert!(t.window().is_none());
        assert!(!t.assigned_time);
    }
}
