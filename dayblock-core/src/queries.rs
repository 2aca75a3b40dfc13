//! Named store queries used by the planner and the maintenance commands.

use chrono::{DateTime, NaiveDate, Utc};

use crate::store::{Filter, Sort, TaskQuery};
use crate::task::{Priority, Status};

/// Statuses that take a task off the planning table.
const CLOSED: [Status; 5] = [
    Status::Done,
    Status::HandedOff,
    Status::Deprecated,
    Status::WaitingOnReply,
    Status::WaitingOnOtherTask,
];

fn open_statuses() -> impl Iterator<Item = Filter> {
    CLOSED.into_iter().map(Filter::StatusIsNot)
}

/// Every open task, most urgent first, oldest first within a priority.
pub fn open_by_priority() -> TaskQuery {
    let mut all = vec![Filter::PriorityIsNot(Priority::Someday)];
    all.extend(open_statuses());
    all.push(Filter::DoneIs(false));
    TaskQuery::new(Filter::And(all))
        .sorted_by(Sort::PriorityAscending)
        .sorted_by(Sort::CreatedAscending)
}

/// Prioritized, not-done tasks due on or before `day` whose assigned-time flag
/// equals `assigned`, oldest first.
pub fn schedulable(day: NaiveDate, assigned: bool) -> TaskQuery {
    TaskQuery::new(Filter::and([
        Filter::DueOnOrBefore(day),
        Filter::AssignedTimeIs(assigned),
        Filter::DoneIs(false),
        Filter::PriorityIsNot(Priority::Someday),
        Filter::PriorityIsNot(Priority::Unassigned),
    ]))
    .sorted_by(Sort::CreatedAscending)
}

/// The time-boxed tasks that make up the existing schedule through `day`.
pub fn current_schedule(day: NaiveDate) -> TaskQuery {
    schedulable(day, true)
}

/// Open tasks still waiting for a priority.
pub fn unassigned() -> TaskQuery {
    let mut all = vec![Filter::PriorityIs(Priority::Unassigned)];
    all.extend(open_statuses());
    all.push(Filter::DoneIs(false));
    TaskQuery::new(Filter::And(all)).sorted_by(Sort::CreatedAscending)
}

/// Time-boxed, unfinished tasks whose window began before `now`.
pub fn overdue_timeboxed(now: DateTime<Utc>) -> TaskQuery {
    TaskQuery::new(Filter::and([
        Filter::DueBefore(now),
        Filter::AssignedTimeIs(true),
        Filter::DoneIs(false),
        Filter::StatusIsNot(Status::Done),
        Filter::StatusIsNot(Status::Deprecated),
        Filter::StatusIsNot(Status::HandedOff),
    ]))
}

/// Time-boxed, unfinished tasks due on or before `day` (the clean-slate set).
pub fn timeboxed_through(day: NaiveDate) -> TaskQuery {
    TaskQuery::new(Filter::and([
        Filter::DueOnOrBefore(day),
        Filter::AssignedTimeIs(true),
        Filter::DoneIs(false),
        Filter::StatusIsNot(Status::Done),
        Filter::StatusIsNot(Status::Deprecated),
        Filter::StatusIsNot(Status::HandedOff),
    ]))
}

/// Open tasks due on `day` or later, used for escalation.
pub fn due_from(day: NaiveDate) -> TaskQuery {
    let mut all = vec![
        Filter::DueOnOrAfter(day),
        Filter::PriorityIsNot(Priority::MustBeDoneToday),
    ];
    all.extend(open_statuses());
    all.push(Filter::DoneIs(false));
    TaskQuery::new(Filter::And(all)).sorted_by(Sort::CreatedAscending)
}

/// Open tasks in `class` due on `day`, used for calendar alignment.
pub fn class_due_on(class: &str, day: NaiveDate) -> TaskQuery {
    let mut all = vec![Filter::ClassIs(class.to_string()), Filter::DueOn(day)];
    all.extend(open_statuses());
    all.push(Filter::DoneIs(false));
    TaskQuery::new(Filter::And(all)).sorted_by(Sort::CreatedAscending)
}

/// Open tasks of any priority, used for duplicate detection.
pub fn all_open() -> TaskQuery {
    TaskQuery::new(Filter::and([
        Filter::StatusIsNot(Status::Done),
        Filter::StatusIsNot(Status::HandedOff),
        Filter::StatusIsNot(Status::Deprecated),
    ]))
    .sorted_by(Sort::CreatedAscending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::store::TaskStore;
    use crate::task::Task;
    use crate::time::{at_local, parse_tz};

    #[test]
    fn open_by_priority_excludes_closed_and_someday() {
        let tz = parse_tz("America/New_York").unwrap();
        let store = MemoryStore::with_tasks(
            tz,
            vec![
                Task::new("1", "low").with_priority(Priority::Low),
                Task::new("2", "someday").with_priority(Priority::Someday),
                Task::new("3", "waiting").with_status(Status::WaitingOnReply),
                Task::new("4", "done").mark_done(),
                Task::new("5", "urgent").with_priority(Priority::MustBeDoneToday),
            ],
        );
        let ids: Vec<_> = store
            .query(&open_by_priority())
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["5", "1"]);
    }

    #[test]
    fn current_schedule_is_timeboxed_through_day() {
        let tz = parse_tz("America/New_York").unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let next = day.succ_opt().unwrap();
        let store = MemoryStore::with_tasks(
            tz,
            vec![
                Task::new("boxed", "a").with_window(at_local(day, 9, 0, tz), at_local(day, 10, 0, tz)),
                Task::new("dated", "b").with_date(day),
                Task::new("later", "c").with_window(at_local(next, 9, 0, tz), at_local(next, 10, 0, tz)),
                Task::new("unassigned", "d")
                    .with_priority(Priority::Unassigned)
                    .with_window(at_local(day, 11, 0, tz), at_local(day, 12, 0, tz)),
            ],
        );
        let ids: Vec<_> = store
            .query(&current_schedule(day))
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["boxed"]);
    }
}
