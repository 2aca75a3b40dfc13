//! Overlap checker: half-open interval intersection in UTC.
//!
//! Stored windows carry whatever offset the store wrote them with, so every
//! comparison happens on the UTC instants, never on local wall-clock values.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Half-open `[start, end)` span of absolute time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start,
            end: start + length,
        }
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// A block ending exactly when another begins does not overlap it.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// True if `candidate` intersects any time-boxed task in `schedule`.
pub fn has_overlap(candidate: &Interval, schedule: &[Task]) -> bool {
    schedule
        .iter()
        .filter_map(Task::window)
        .any(|w| candidate.overlaps(&w))
}

/// First task in schedule order whose window intersects `candidate`,
/// ignoring the task identified by `exclude_id`.
pub fn first_conflict<'a>(
    candidate: &Interval,
    schedule: &'a [Task],
    exclude_id: &str,
) -> Option<(&'a Task, Interval)> {
    schedule
        .iter()
        .filter(|t| t.id != exclude_id)
        .filter_map(|t| t.window().map(|w| (t, w)))
        .find(|(_, w)| candidate.overlaps(w))
}
