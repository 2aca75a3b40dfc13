//! Planners for the bulk housekeeping commands.
//!
//! Each planner is pure: it turns a task snapshot into a list of patches. The
//! caller decides whether to send them one by one or fanned out.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::{error, info};

use crate::store::{TaskPatch, TaskStore};
use crate::task::{Due, Priority, Status, Task};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPatch {
    pub task_id: String,
    pub task_name: String,
    pub patch: TaskPatch,
}

impl PlannedPatch {
    fn new(task: &Task, patch: TaskPatch) -> Self {
        Self {
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            patch,
        }
    }
}

/// Clean slate: push every unfinished time-boxed task to a date-only `today`.
pub fn overdue_to_today(tasks: &[Task], today: NaiveDate) -> Vec<PlannedPatch> {
    tasks
        .iter()
        .filter(|t| !t.done && !t.status.is_terminal() && t.assigned_time)
        .map(|t| PlannedPatch::new(t, TaskPatch::new().with_due(Due::Date(today))))
        .collect()
}

/// Among tasks sharing a display name keep the oldest, deprecate the rest.
///
/// Tasks without a creation time sort after dated ones; ties keep input order.
pub fn duplicate_deprecations(tasks: &[Task]) -> Vec<PlannedPatch> {
    let mut groups: HashMap<&str, Vec<&Task>> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for task in tasks {
        let entry = groups.entry(task.name.as_str()).or_default();
        if entry.is_empty() {
            order.push(task.name.as_str());
        }
        entry.push(task);
    }

    let mut plans = Vec::new();
    for name in order {
        let Some(group) = groups.get_mut(name) else { continue };
        if group.len() < 2 {
            continue;
        }
        group.sort_by_key(|t| (t.created_time.is_none(), t.created_time));
        for dup in group.iter().skip(1) {
            plans.push(PlannedPatch::new(dup, TaskPatch::new().with_status(Status::Deprecated)));
        }
    }
    plans
}

/// Promote tasks due in `[today, today + horizon_days)` to MustBeDoneToday.
pub fn escalations(tasks: &[Task], today: NaiveDate, tz: Tz, horizon_days: u32) -> Vec<PlannedPatch> {
    let until = today + Duration::days(horizon_days.into());
    tasks
        .iter()
        .filter(|t| t.priority != Priority::MustBeDoneToday && !t.done)
        .filter(|t| {
            t.due
                .map(|d| d.date_in(tz))
                .is_some_and(|d| d >= today && d < until)
        })
        .map(|t| PlannedPatch::new(t, TaskPatch::new().with_priority(Priority::MustBeDoneToday)))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub failed: usize,
}

/// Send plans one at a time. Failures are logged and counted, never retried.
pub fn apply_all<S: TaskStore + ?Sized>(store: &S, plans: &[PlannedPatch]) -> ApplyReport {
    let mut report = ApplyReport::default();
    for plan in plans {
        match store.patch(&plan.task_id, &plan.patch) {
            Ok(()) => {
                info!(task = %plan.task_name, patch = %plan.patch.describe(), "updated");
                report.applied += 1;
            }
            Err(e) => {
                error!(task = %plan.task_name, error = %e, "update failed");
                report.failed += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::time::{at_local, parse_tz};
    use chrono::{TimeZone, Utc};

    fn tz() -> Tz {
        parse_tz("America/New_York").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn clean_slate_only_touches_open_timeboxed_tasks() {
        let tasks = vec![
            Task::new("a", "a").with_window(at_local(day(1), 9, 0, tz()), at_local(day(1), 10, 0, tz())),
            Task::new("b", "b").with_date(day(1)),
            Task::new("c", "c")
                .with_window(at_local(day(1), 9, 0, tz()), at_local(day(1), 10, 0, tz()))
                .mark_done(),
        ];
        let plans = overdue_to_today(&tasks, day(2));
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].task_id, "a");
        assert_eq!(plans[0].patch.due, Some(Due::Date(day(2))));
    }

    #[test]
    fn oldest_duplicate_survives() {
        let created = |h| Utc.with_ymd_and_hms(2026, 3, 1, h, 0, 0).unwrap();
        let tasks = vec![
            Task::new("new", "Water plants").with_created(created(9)),
            Task::new("old", "Water plants").with_created(created(7)),
            Task::new("undated", "Water plants"),
            Task::new("solo", "Pay rent").with_created(created(8)),
        ];
        let ids: Vec<_> = duplicate_deprecations(&tasks).into_iter().map(|p| p.task_id).collect();
        assert_eq!(ids, vec!["new", "undated"]);
    }

    #[test]
    fn escalation_window_is_half_open() {
        let tasks = vec![
            Task::new("today", "a").with_date(day(2)),
            Task::new("edge", "b").with_date(day(5)),
            Task::new("inside", "c").with_window(at_local(day(4), 22, 0, tz()), at_local(day(4), 23, 0, tz())),
            Task::new("already", "d").with_priority(Priority::MustBeDoneToday).with_date(day(2)),
            Task::new("past", "e").with_date(day(1)),
        ];
        let ids: Vec<_> = escalations(&tasks, day(2), tz(), 3).into_iter().map(|p| p.task_id).collect();
        assert_eq!(ids, vec!["today", "inside"]);
    }

    #[test]
    fn apply_all_counts_failures() {
        let store = MemoryStore::with_tasks(tz(), vec![Task::new("a", "a")]);
        let plans = vec![
            PlannedPatch::new(&Task::new("a", "a"), TaskPatch::new().with_status(Status::Deprecated)),
            PlannedPatch::new(&Task::new("ghost", "ghost"), TaskPatch::new().with_status(Status::Deprecated)),
        ];
        let report = apply_all(&store, &plans);
        assert_eq!(report, ApplyReport { applied: 1, failed: 1 });
    }
}
