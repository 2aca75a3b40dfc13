use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use dayblock_core::{
    free_blocks, local_today, queries, session_start, total_free, triage, Due, DryRunStore, Interval, Priority,
    Schedule, ScheduleWindow, SchedulerContext, Session, SessionFlags, SessionReport, TaskDraft, TaskStore,
};
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use crate::calendar::commits_to_ics;
use crate::config::Config;
use crate::prompt::{confirm, triage_choice, LineOperator};
use crate::state;

pub const ANCHOR_TASK: &str = "Schedule Day";

#[derive(Debug, Clone, Default)]
pub struct PlanOptions {
    pub tomorrow: bool,
    pub dry_run: bool,
    pub accept_all: bool,
    pub by_effort: bool,
    pub skip_triage: bool,
    /// `Some(None)` writes to the default location.
    pub ics: Option<Option<PathBuf>>,
}

/// The remote store, or a logging stand-in when `dry_run` is set.
pub fn open_store(cfg: &Config, dry_run: bool) -> Result<Box<dyn TaskStore>> {
    let remote = cfg.notion_store()?;
    if dry_run {
        println!("Dry run: no changes will be written.\n");
        Ok(Box::new(DryRunStore::new(remote)))
    } else {
        Ok(Box::new(remote))
    }
}

fn next_day(day: NaiveDate) -> NaiveDate {
    day.succ_opt().unwrap_or(day)
}

fn hm(t: DateTime<Utc>, tz: Tz) -> String {
    t.with_timezone(&tz).format("%H:%M").to_string()
}

/// Print the day's existing blocks and what is still free; returns the free blocks.
pub fn print_overview(
    store: &dyn TaskStore,
    window: &ScheduleWindow,
    day: NaiveDate,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<Interval> {
    let existing = match store.query(&queries::current_schedule(day)) {
        Ok(tasks) => tasks,
        Err(e) => {
            error!(error = %e, "could not read current schedule");
            Vec::new()
        }
    };

    let mut on_day: Vec<_> = existing
        .iter()
        .filter_map(|t| t.window().map(|w| (w, t.name.as_str())))
        .filter(|(w, _)| w.start.with_timezone(&tz).date_naive() == day)
        .collect();
    on_day.sort_by_key(|(w, _)| w.start);

    println!("# {}\n", day.format("%A, %B %-d"));
    if on_day.is_empty() {
        println!("Nothing time-boxed yet.");
    }
    for (w, name) in &on_day {
        println!("  {} - {}  {}", hm(w.start, tz), hm(w.end, tz), name);
    }

    let schedule = Schedule::from_tasks(existing);
    let free = free_blocks(&schedule, window, day, now, tz);
    println!("\nFree:");
    if free.is_empty() {
        println!("  (none)");
    }
    for f in &free {
        println!("  {} - {}", hm(f.start, tz), hm(f.end, tz));
    }
    let total = total_free(&free);
    println!("  total {}h{:02}m\n", total.num_hours(), total.num_minutes() % 60);
    free
}

pub fn run_overview(cfg: &Config, tomorrow: bool) -> Result<()> {
    let tz = cfg.tz()?;
    let window = cfg.window()?;
    let store = cfg.notion_store()?;
    let now = Utc::now();
    let today = local_today(now, tz);
    let day = if tomorrow { next_day(today) } else { today };
    print_overview(&store, &window, day, now, tz);
    Ok(())
}

/// Classify every unassigned task, one prompt each.
pub fn run_triage(store: &dyn TaskStore) -> Result<()> {
    let tasks = store.query(&queries::unassigned()).context("load unassigned tasks")?;
    if tasks.is_empty() {
        println!("No unassigned tasks.");
        return Ok(());
    }
    println!("{} unassigned task(s):", tasks.len());
    let summary = triage(store, &tasks, triage_choice);
    println!(
        "\nTriage: {} updated, {} unchanged, {} failed\n",
        summary.updated, summary.unchanged, summary.failed
    );
    Ok(())
}

fn create_anchor(store: &dyn TaskStore, now: DateTime<Utc>, tz: Tz) {
    let window = Interval::starting_at(now, Duration::minutes(30));
    let draft = TaskDraft::new(ANCHOR_TASK, Priority::High)
        .with_class("Admin")
        .with_due(Due::window_in(window, tz));
    match store.create(&draft) {
        Ok(id) => info!(task_id = %id, "planning task created"),
        Err(e) => error!(error = %e, "could not create planning task"),
    }
}

pub fn print_report(report: &SessionReport, tz: Tz) {
    println!("\n# Session\n");
    for c in &report.committed {
        println!("  {} - {}  {}", hm(c.window.start, tz), hm(c.window.end, tz), c.name);
    }
    if !report.deferred.is_empty() {
        println!("\nDeferred: {}", report.deferred.len());
    }
    if !report.closed.is_empty() {
        println!("Closed: {}", report.closed.len());
    }
    if !report.skipped.is_empty() {
        println!("Skipped duplicates: {}", report.skipped.len());
    }
    if report.halted {
        println!("\nStopped early.");
    }
    if let Some(cursor) = report.cursor {
        println!("Next free start: {}", cursor.with_timezone(&tz).format("%a %H:%M"));
    }
}

pub fn run_plan(cfg: &Config, opts: PlanOptions) -> Result<()> {
    let tz = cfg.tz()?;
    let window = cfg.window()?;
    let mut policy = cfg.policy();
    if opts.by_effort {
        policy.size_by_effort = true;
    }
    let store = open_store(cfg, opts.dry_run)?;

    let now = Utc::now();
    let today = local_today(now, tz);
    let mut day = if opts.tomorrow { next_day(today) } else { today };

    let free = print_overview(store.as_ref(), &window, day, now, tz);
    if day == today && free.is_empty() {
        if !confirm("No free time left today. Plan tomorrow instead?")? {
            println!("Nothing to plan.");
            return Ok(());
        }
        day = next_day(today);
    }

    if cfg.schedule.create_anchor_task && day == today {
        create_anchor(store.as_ref(), now, tz);
    }
    if !opts.skip_triage {
        run_triage(store.as_ref())?;
    }

    let queue = store
        .query(&queries::schedulable(day, false))
        .context("load tasks to schedule")?;
    if queue.is_empty() {
        println!("No unscheduled tasks due by {}.", day);
        return Ok(());
    }

    let cursor = session_start(now, day, tz, &window);
    let ctx = SchedulerContext::new(tz, day, now)
        .with_window(window)
        .with_policy(policy)
        .with_later_start_hour(cfg.schedule.later_start_hour);
    let flags = SessionFlags {
        accept_all: opts.accept_all,
        ..Default::default()
    };

    let session = Session::start(store.as_ref(), ctx, cursor, flags);
    let mut operator = LineOperator::stdin(today);
    let report = session.run(queue, &mut operator);
    print_report(&report, tz);

    if let Some(path) = opts.ics {
        let path = match path {
            Some(p) => p,
            None => state::default_ics_path(day)?,
        };
        fs::write(&path, commits_to_ics(&report.committed)).with_context(|| format!("write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}
