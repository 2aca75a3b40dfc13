//! Session driver: queue partitioning and the two-pass drain.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::decision::Operator;
use crate::queries;
use crate::reconcile::{reconcile, Reconciliation};
use crate::schedule::Schedule;
use crate::scheduler::{schedule_task, Commit, Outcome, SchedulerContext, SessionFlags, SessionState};
use crate::store::{TaskPatch, TaskStore};
use crate::task::{Due, Priority, Status, Task};

/// Split into (high, low) queues. Done tasks are dropped; urgent-today tasks
/// lead the high queue, input order kept otherwise.
pub fn partition(tasks: Vec<Task>) -> (Vec<Task>, Vec<Task>) {
    let (mut high, low): (Vec<Task>, Vec<Task>) = tasks
        .into_iter()
        .filter(|t| !t.done)
        .partition(|t| t.priority.is_high());
    high.sort_by_key(|t| t.priority != Priority::MustBeDoneToday);
    (high, low)
}

/// What happened over one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub committed: Vec<Commit>,
    pub deferred: Vec<(String, NaiveDate)>,
    pub closed: Vec<(String, Status)>,
    pub skipped: Vec<String>,
    pub halted: bool,
    /// Cursor after the last task.
    pub cursor: Option<DateTime<Utc>>,
    /// Final in-memory schedule.
    pub schedule: Schedule,
}

pub struct Session<'s, S: TaskStore + ?Sized> {
    store: &'s S,
    ctx: SchedulerContext,
    state: SessionState,
}

impl<'s, S: TaskStore + ?Sized> Session<'s, S> {
    /// Read the existing schedule once, reconcile its conflicts, and demote
    /// every conflicting block in the store.
    pub fn start(store: &'s S, ctx: SchedulerContext, cursor: DateTime<Utc>, flags: SessionFlags) -> Self {
        let existing = match store.query(&queries::current_schedule(ctx.day)) {
            Ok(tasks) => tasks,
            Err(e) => {
                error!(error = %e, "could not read current schedule, starting empty");
                Vec::new()
            }
        };

        let Reconciliation { kept, demoted, dropped } = reconcile(existing, ctx.tz);
        for d in &demoted {
            warn!(task = %d.task_name, date = %d.date, "overlapping block demoted to date only");
            if let Err(e) = store.patch(&d.task_id, &TaskPatch::new().with_due(Due::Date(d.date))) {
                error!(task = %d.task_name, error = %e, "demotion failed");
            }
        }
        if !dropped.is_empty() {
            info!(count = dropped.len(), "conflicting blocks dropped from this session's schedule");
        }

        let state = SessionState::new(cursor, Schedule::from_tasks(kept)).with_flags(flags);
        Self { store, ctx, state }
    }

    /// Start from a known schedule without touching the store.
    pub fn with_schedule(store: &'s S, ctx: SchedulerContext, cursor: DateTime<Utc>, schedule: Schedule) -> Self {
        Self {
            store,
            ctx,
            state: SessionState::new(cursor, schedule),
        }
    }

    pub fn flags_mut(&mut self) -> &mut SessionFlags {
        &mut self.state.flags
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Drain the high queue, then the low queue. A halt abandons both.
    pub fn run<O: Operator + ?Sized>(mut self, tasks: Vec<Task>, operator: &mut O) -> SessionReport {
        let (high, low) = partition(tasks);
        info!(high = high.len(), low = low.len(), "scheduling");

        let mut report = SessionReport::default();
        for task in high.iter().chain(low.iter()) {
            match schedule_task(task, &mut self.state, &self.ctx, self.store, operator) {
                Outcome::Committed(_) => {}
                Outcome::Deferred(date) => report.deferred.push((task.id.clone(), date)),
                Outcome::Terminal(status) => report.closed.push((task.id.clone(), status)),
                Outcome::Skipped => report.skipped.push(task.id.clone()),
                Outcome::Halted => {
                    report.halted = true;
                    break;
                }
            }
        }

        report.committed = self.state.commits;
        report.cursor = Some(self.state.cursor);
        report.schedule = self.state.schedule;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_drops_done_and_orders_urgent_first() {
        let tasks = vec![
            Task::new("1", "a").with_priority(Priority::High),
            Task::new("2", "b").with_priority(Priority::Low),
            Task::new("3", "c").with_priority(Priority::MustBeDoneToday),
            Task::new("4", "d").with_priority(Priority::High).mark_done(),
            Task::new("5", "e").with_priority(Priority::High),
            Task::new("6", "f").with_priority(Priority::Unassigned),
        ];
        let (high, low) = partition(tasks);
        let ids = |v: &[Task]| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&high), vec!["3", "1", "5"]);
        assert_eq!(ids(&low), vec!["2", "6"]);
    }
}
