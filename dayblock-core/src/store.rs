//! Task store port: queries, property patches, and task creation.
//!
//! The remote store is the source of truth. The planner reads it once per
//! session and afterwards only writes patches; it never re-reads.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::info;

use crate::task::{Due, Priority, Status, Task};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Request(String),
    #[error("store rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("malformed store response: {0}")]
    Malformed(String),
}

/// Property filter, evaluated remotely or by [`Filter::matches`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    And(Vec<Filter>),
    PriorityIs(Priority),
    PriorityIsNot(Priority),
    StatusIsNot(Status),
    DoneIs(bool),
    AssignedTimeIs(bool),
    ClassIs(String),
    DueOn(NaiveDate),
    DueOnOrBefore(NaiveDate),
    DueOnOrAfter(NaiveDate),
    /// Strictly before an instant; date-only dues start at local midnight.
    DueBefore(DateTime<Utc>),
}

impl Filter {
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    /// Local evaluation, used by in-memory stores. Date filters never match a
    /// task without a due.
    pub fn matches(&self, task: &Task, tz: Tz) -> bool {
        match self {
            Filter::And(all) => all.iter().all(|f| f.matches(task, tz)),
            Filter::PriorityIs(p) => task.priority == *p,
            Filter::PriorityIsNot(p) => task.priority != *p,
            Filter::StatusIsNot(s) => task.status != *s,
            Filter::DoneIs(d) => task.done == *d,
            Filter::AssignedTimeIs(a) => task.assigned_time == *a,
            Filter::ClassIs(c) => task.class.as_deref() == Some(c.as_str()),
            Filter::DueOn(d) => task.due.is_some_and(|due| due.date_in(tz) == *d),
            Filter::DueOnOrBefore(d) => task.due.is_some_and(|due| due.date_in(tz) <= *d),
            Filter::DueOnOrAfter(d) => task.due.is_some_and(|due| due.date_in(tz) >= *d),
            Filter::DueBefore(t) => task.due.is_some_and(|due| due.start_instant(tz) < *t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    /// Most urgent first.
    PriorityAscending,
    CreatedAscending,
}

impl Sort {
    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            Sort::PriorityAscending => a.priority.rank().cmp(&b.priority.rank()),
            Sort::CreatedAscending => a.created_time.cmp(&b.created_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskQuery {
    pub filter: Filter,
    pub sorts: Vec<Sort>,
}

impl TaskQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            sorts: Vec::new(),
        }
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }
}

/// Stable multi-key sort; earlier keys dominate.
pub fn sort_tasks(tasks: &mut [Task], sorts: &[Sort]) {
    tasks.sort_by(|a, b| {
        sorts
            .iter()
            .map(|s| s.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due: Option<Due>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_due(mut self, due: Due) -> Self {
        self.due = Some(due);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.priority.is_none() && self.status.is_none() && self.due.is_none()
    }

    /// Mirror the patch onto a local snapshot. A due rewrites the
    /// assigned-time flag; status Done also ticks the done flag.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(status) = self.status {
            task.status = status;
            if status == Status::Done {
                task.done = true;
            }
        }
        if let Some(due) = self.due {
            task.assigned_time = due.is_timed();
            task.due = Some(due);
        }
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(name) = &self.name {
            parts.push(format!("name={name:?}"));
        }
        if let Some(p) = self.priority {
            parts.push(format!("priority={p}"));
        }
        if let Some(s) = self.status {
            parts.push(format!("status={s}"));
        }
        match self.due {
            Some(Due::Date(d)) => parts.push(format!("due={d}")),
            Some(Due::Timed { start, end }) => match end {
                Some(end) => parts.push(format!(
                    "due={}..{}",
                    start.format("%Y-%m-%d %H:%M"),
                    end.format("%H:%M")
                )),
                None => parts.push(format!("due={}", start.format("%Y-%m-%d %H:%M"))),
            },
            None => {}
        }
        parts.join(" ")
    }
}

/// Properties for a newly created task.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub name: String,
    pub priority: Priority,
    pub class: Option<String>,
    pub due: Option<Due>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, priority: Priority) -> Self {
        Self {
            name: name.into(),
            priority,
            class: None,
            due: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_due(mut self, due: Due) -> Self {
        self.due = Some(due);
        self
    }
}

pub trait TaskStore {
    fn query(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;
    fn patch(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError>;
    fn create(&self, draft: &TaskDraft) -> Result<String, StoreError>;
}

impl<S: TaskStore + ?Sized> TaskStore for &S {
    fn query(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        (**self).query(query)
    }

    fn patch(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        (**self).patch(task_id, patch)
    }

    fn create(&self, draft: &TaskDraft) -> Result<String, StoreError> {
        (**self).create(draft)
    }
}

/// Reads pass through; writes are logged and dropped.
pub struct DryRunStore<S> {
    inner: S,
    created: AtomicUsize,
}

impl<S: TaskStore> DryRunStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            created: AtomicUsize::new(0),
        }
    }
}

impl<S: TaskStore> TaskStore for DryRunStore<S> {
    fn query(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        self.inner.query(query)
    }

    fn patch(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        info!(task_id, patch = %patch.describe(), "dry run: patch skipped");
        Ok(())
    }

    fn create(&self, draft: &TaskDraft) -> Result<String, StoreError> {
        let n = self.created.fetch_add(1, AtomicOrdering::Relaxed) + 1;
        info!(name = %draft.name, "dry run: create skipped");
        Ok(format!("dry-run-{n}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{at_local, parse_tz};
    use chrono::TimeZone;

    fn tz() -> Tz {
        parse_tz("America/New_York").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn date_filters_compare_local_days() {
        // 23:30 local on the 2nd is already the 3rd in UTC.
        let t = Task::new("a", "late").with_window(at_local(day(2), 23, 30, tz()), at_local(day(2), 23, 45, tz()));
        assert!(Filter::DueOn(day(2)).matches(&t, tz()));
        assert!(!Filter::DueOn(day(3)).matches(&t, tz()));
        assert!(Filter::DueOnOrBefore(day(2)).matches(&t, tz()));
        assert!(!Filter::DueOnOrAfter(day(3)).matches(&t, tz()));
    }

    #[test]
    fn missing_due_never_matches_date_filters() {
        let t = Task::new("a", "floating");
        assert!(!Filter::DueOnOrBefore(day(9)).matches(&t, tz()));
        assert!(!Filter::DueBefore(Utc::now()).matches(&t, tz()));
        assert!(Filter::and([Filter::DoneIs(false), Filter::AssignedTimeIs(false)]).matches(&t, tz()));
    }

    #[test]
    fn due_before_uses_local_midnight_for_dates() {
        let t = Task::new("a", "errand").with_date(day(2));
        let midnight = at_local(day(2), 0, 0, tz()).with_timezone(&Utc);
        assert!(!Filter::DueBefore(midnight).matches(&t, tz()));
        assert!(Filter::DueBefore(midnight + chrono::Duration::minutes(1)).matches(&t, tz()));
    }

    #[test]
    fn multi_key_sort_is_stable() {
        let created = |h| Utc.with_ymd_and_hms(2026, 3, 1, h, 0, 0).unwrap();
        let mut tasks = vec![
            Task::new("1", "a").with_priority(Priority::Low).with_created(created(3)),
            Task::new("2", "b").with_priority(Priority::MustBeDoneToday).with_created(created(5)),
            Task::new("3", "c").with_priority(Priority::Low).with_created(created(1)),
            Task::new("4", "d").with_priority(Priority::High).with_created(created(2)),
        ];
        sort_tasks(&mut tasks, &[Sort::PriorityAscending, Sort::CreatedAscending]);
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4", "3", "1"]);
    }

    #[test]
    fn patch_mirrors_onto_snapshot() {
        let mut t = Task::new("a", "call").with_window(at_local(day(2), 9, 0, tz()), at_local(day(2), 10, 0, tz()));
        TaskPatch::new().with_due(Due::Date(day(3))).apply_to(&mut t);
        assert!(!t.assigned_time);
        assert!(t.window().is_none());

        TaskPatch::new().with_status(Status::Done).apply_to(&mut t);
        assert!(t.done);
        assert!(TaskPatch::new().is_empty());
    }

    #[test]
    fn dry_run_reads_through_and_drops_writes() {
        let store = crate::memory_store::MemoryStore::with_tasks(tz(), vec![Task::new("a", "call").with_date(day(2))]);
        let dry = DryRunStore::new(&store);

        assert_eq!(dry.query(&TaskQuery::new(Filter::DoneIs(false))).unwrap().len(), 1);
        dry.patch("a", &TaskPatch::new().with_status(Status::Done)).unwrap();
        assert_eq!(dry.create(&TaskDraft::new("x", Priority::High)).unwrap(), "dry-run-1");

        assert!(store.patches().is_empty());
        assert!(store.created().is_empty());
        assert!(!store.get("a").unwrap().done);
    }
}
