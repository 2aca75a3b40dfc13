//! Single-task scheduler: propose a block, repair it, and run the decision loop.
//!
//! Each task is fully resolved before the next one is looked at, since later
//! overlap checks depend on earlier commits. All session-wide state lives in
//! [`SessionState`], owned by the driver and lent to one task at a time.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::decision::{CutoffChoice, Decision, Operator, Proposal};
use crate::overlap::Interval;
use crate::policy::BlockPolicy;
use crate::schedule::Schedule;
use crate::store::{TaskPatch, TaskStore};
use crate::task::{Due, Priority, Status, Task};
use crate::time::{at_local, at_local_time, ceil_to_half_hour, ScheduleWindow};

/// Mode switches shared by every task in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    /// Commit without asking.
    pub accept_all: bool,
    /// Keep scheduling past the cutoff.
    pub allow_late_night: bool,
    /// Anchor every task to the window start and skip overlap repair.
    pub ignore_availability: bool,
}

/// Static inputs for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerContext {
    pub tz: Tz,
    /// Target day being planned.
    pub day: NaiveDate,
    pub now: DateTime<Utc>,
    pub window: ScheduleWindow,
    pub policy: BlockPolicy,
    /// Earliest local hour for tasks marked "not started (later)".
    pub later_start_hour: u32,
}

impl SchedulerContext {
    pub fn new(tz: Tz, day: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            tz,
            day,
            now,
            window: ScheduleWindow::default(),
            policy: BlockPolicy::default(),
            later_start_hour: 18,
        }
    }

    pub fn with_window(mut self, window: ScheduleWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_policy(mut self, policy: BlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_later_start_hour(mut self, hour: u32) -> Self {
        self.later_start_hour = hour;
        self
    }

    fn cutoff(&self) -> DateTime<Utc> {
        self.window.cutoff_on(self.day, self.tz).with_timezone(&Utc)
    }
}

/// A block written during the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub task_id: String,
    pub name: String,
    pub priority: Priority,
    pub window: Interval,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Where the next proposal starts. Never moves backwards.
    pub cursor: DateTime<Utc>,
    pub schedule: Schedule,
    /// Display names already presented this session.
    pub seen: HashSet<String>,
    pub flags: SessionFlags,
    pub commits: Vec<Commit>,
}

impl SessionState {
    pub fn new(cursor: DateTime<Utc>, schedule: Schedule) -> Self {
        Self {
            cursor,
            schedule,
            seen: HashSet::new(),
            flags: SessionFlags::default(),
            commits: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: SessionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn advance(&mut self, to: DateTime<Utc>) {
        self.cursor = self.cursor.max(to);
    }
}

/// How one task left the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Committed(Interval),
    Deferred(NaiveDate),
    Terminal(Status),
    /// Same display name already handled this session.
    Skipped,
    /// Stop the whole session.
    Halted,
}

enum Placement {
    At(Interval),
    Tomorrow(NaiveDate),
    Halt,
}

fn proposal_for(task: &Task, window: Interval, ctx: &SchedulerContext) -> Proposal {
    Proposal {
        task_id: task.id.clone(),
        name: task.name.clone(),
        priority: task.priority,
        effort: task.effort,
        start: window.start.with_timezone(&ctx.tz),
        end: window.end.with_timezone(&ctx.tz),
        minutes: ctx.policy.minutes_for(task),
    }
}

/// Natural start before any repair: the cursor, pushed to the evening for
/// "later" tasks.
fn natural_start(task: &Task, cursor: DateTime<Utc>, ctx: &SchedulerContext) -> DateTime<Utc> {
    if task.status != Status::NotStartedLater {
        return cursor;
    }
    let date = cursor.with_timezone(&ctx.tz).date_naive();
    let evening = at_local(date, ctx.later_start_hour, 0, ctx.tz).with_timezone(&Utc);
    cursor.max(evening)
}

/// Boundary check, ignore-availability anchoring and forward overlap repair.
fn place<O: Operator + ?Sized>(
    task: &Task,
    mut start: DateTime<Utc>,
    length: Duration,
    state: &mut SessionState,
    ctx: &SchedulerContext,
    operator: &mut O,
) -> Placement {
    loop {
        let flags = state.flags;
        if !flags.allow_late_night && !flags.ignore_availability && start >= ctx.cutoff() {
            let candidate = Interval::starting_at(start, length);
            info!(task = %task.name, start = %start.with_timezone(&ctx.tz), "candidate is past the cutoff");
            match operator.at_cutoff(&proposal_for(task, candidate, ctx)) {
                Some(CutoffChoice::AllowLateNight) => {
                    state.flags.allow_late_night = true;
                }
                Some(CutoffChoice::Tomorrow) => {
                    return Placement::Tomorrow(start.with_timezone(&ctx.tz).date_naive());
                }
                Some(CutoffChoice::IgnoreAvailability) => {
                    state.flags.ignore_availability = true;
                    continue;
                }
                Some(CutoffChoice::Halt) | None => return Placement::Halt,
            }
        }

        if state.flags.ignore_availability {
            let local = start.with_timezone(&ctx.tz);
            let date = local.date_naive();
            let leave = date == ctx.day && local.hour() < ctx.window.cutoff_hour;
            if !leave {
                let anchor = ctx.window.start_on(date, ctx.tz);
                let earliest = ceil_to_half_hour(ctx.now.with_timezone(&ctx.tz));
                start = anchor.max(earliest).with_timezone(&Utc);
            }
            return Placement::At(Interval::starting_at(start, length));
        }

        let candidate = Interval::starting_at(start, length);
        match state.schedule.first_conflict(&candidate, &task.id) {
            Some(conflict) => {
                debug!(task = %task.name, to = %conflict.end.with_timezone(&ctx.tz), "overlap, shifting");
                start = conflict.end;
            }
            None => return Placement::At(candidate),
        }
    }
}

fn write<S: TaskStore + ?Sized>(store: &S, task: &Task, patch: &TaskPatch) {
    match store.patch(&task.id, patch) {
        Ok(()) => debug!(task = %task.name, patch = %patch.describe(), "patched"),
        Err(e) => error!(task = %task.name, error = %e, "store patch failed"),
    }
}

/// Write the window back and record it in the session. The in-memory schedule
/// is updated before the store write and is not rolled back if it fails.
fn commit<S: TaskStore + ?Sized>(
    task: &mut Task,
    window: Interval,
    state: &mut SessionState,
    ctx: &SchedulerContext,
    store: &S,
) -> Outcome {
    let due = Due::window_in(window, ctx.tz);
    task.due = Some(due);
    task.assigned_time = true;

    state.schedule.upsert(task.clone());
    state.advance(window.end);
    state.commits.push(Commit {
        task_id: task.id.clone(),
        name: task.name.clone(),
        priority: task.priority,
        window,
    });

    info!(
        task = %task.name,
        start = %window.start.with_timezone(&ctx.tz).format("%H:%M"),
        end = %window.end.with_timezone(&ctx.tz).format("%H:%M"),
        "scheduled"
    );
    write(store, task, &TaskPatch::new().with_due(due).with_priority(task.priority));
    Outcome::Committed(window)
}

fn defer<S: TaskStore + ?Sized>(task: &Task, date: NaiveDate, state: &mut SessionState, store: &S) -> Outcome {
    state.schedule.remove(&task.id);
    info!(task = %task.name, %date, "deferred");
    write(store, task, &TaskPatch::new().with_due(Due::Date(date)));
    Outcome::Deferred(date)
}

fn terminate<S: TaskStore + ?Sized>(
    task: &Task,
    status: Status,
    window: Interval,
    state: &mut SessionState,
    store: &S,
) -> Outcome {
    state.schedule.remove(&task.id);
    // The slot was spent deciding.
    state.advance(window.end);
    info!(task = %task.name, %status, "closed");
    write(store, task, &TaskPatch::new().with_status(status));
    Outcome::Terminal(status)
}

/// Run one task through proposal, repair and the decision loop.
pub fn schedule_task<S, O>(
    task: &Task,
    state: &mut SessionState,
    ctx: &SchedulerContext,
    store: &S,
    operator: &mut O,
) -> Outcome
where
    S: TaskStore + ?Sized,
    O: Operator + ?Sized,
{
    if state.seen.contains(&task.name) {
        info!(task = %task.name, "already scheduled this session, skipping");
        return Outcome::Skipped;
    }

    let mut task = task.clone();
    let mut pinned_start: Option<DateTime<Utc>> = None;
    let mut first_pass = true;

    loop {
        let length = ctx.policy.length_for(&task);
        let start = pinned_start.unwrap_or_else(|| natural_start(&task, state.cursor, ctx));

        let window = match place(&task, start, length, state, ctx, operator) {
            Placement::At(window) => window,
            Placement::Tomorrow(date) => {
                return defer(&task, date + Duration::days(1), state, store);
            }
            Placement::Halt => {
                warn!(task = %task.name, "session halted at the cutoff");
                return Outcome::Halted;
            }
        };

        if first_pass {
            first_pass = false;
            state.seen.insert(task.name.clone());
        }

        if state.flags.accept_all {
            return commit(&mut task, window, state, ctx, store);
        }

        let proposal = proposal_for(&task, window, ctx);
        let local_date = proposal.date();
        let Some(decision) = operator.decide(&proposal) else {
            warn!(task = %task.name, "no decision, halting");
            return Outcome::Halted;
        };

        match decision {
            Decision::Apply => return commit(&mut task, window, state, ctx, store),
            Decision::AcceptAll => {
                let outcome = commit(&mut task, window, state, ctx, store);
                state.flags.accept_all = true;
                return outcome;
            }
            Decision::DeferTomorrow => {
                return defer(&task, local_date + Duration::days(1), state, store);
            }
            Decision::DeferWeek => {
                return defer(&task, local_date + Duration::days(7), state, store);
            }
            Decision::DeferTo(date) => return defer(&task, date, state, store),
            Decision::MarkDone => return terminate(&task, Status::Done, window, state, store),
            Decision::Deprecate => {
                return terminate(&task, Status::Deprecated, window, state, store);
            }
            Decision::PromoteHigh => {
                task.priority = Priority::High;
                return commit(&mut task, window, state, ctx, store);
            }
            Decision::Rename(name) => {
                info!(from = %task.name, to = %name, "renamed");
                write(store, &task, &TaskPatch::new().with_name(name.clone()));
                state.schedule.rename(&task.id, &name);
                state.seen.insert(name.clone());
                task.name = name;
                pinned_start = Some(window.start);
            }
            Decision::OverrideTime(time) => {
                pinned_start = Some(at_local_time(local_date, time, ctx.tz).with_timezone(&Utc));
            }
        }
    }
}
