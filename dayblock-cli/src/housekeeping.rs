use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use dayblock_core::{
    apply_all, duplicate_deprecations, escalations, events_matching, local_today, overdue_to_today,
    pack_into_events, queries, ApplyReport, CalendarSource, Due, DryRunStore, PlannedPatch, TaskPatch, TaskStore,
};
use dayblock_notion::{patch_all, BlockingStore, NotionClient};
use std::sync::Arc;
use tracing::{error, info};

use crate::calendar::GoogleCalendar;
use crate::config::Config;
use crate::plan::open_store;

fn print_plans(label: &str, plans: &[PlannedPatch]) {
    println!("{label}: {} task(s)", plans.len());
    for p in plans {
        println!("  - {}: {}", p.task_name, p.patch.describe());
    }
}

/// Send the plans concurrently, or only log them on a dry run.
async fn send(cfg: &Config, client: NotionClient, plans: Vec<PlannedPatch>, dry_run: bool) -> ApplyReport {
    if dry_run {
        let store = DryRunStore::new(BlockingStore::new(client));
        return apply_all(&store, &plans);
    }
    patch_all(Arc::new(client), plans, cfg.notion.concurrency).await
}

fn print_apply(report: &ApplyReport) {
    println!("\n{} updated, {} failed", report.applied, report.failed);
}

/// Push every unfinished time-boxed task back to a date-only due of today.
pub async fn clean_slate(cfg: &Config, overdue_only: bool, dry_run: bool) -> Result<()> {
    let tz = cfg.tz()?;
    let client = cfg.notion_client()?;
    let now = Utc::now();
    let today = local_today(now, tz);

    let query = if overdue_only {
        queries::overdue_timeboxed(now)
    } else {
        queries::timeboxed_through(today)
    };
    let tasks = client.query(&query).await.context("load time-boxed tasks")?;
    let plans = overdue_to_today(&tasks, today);
    print_plans("Clean slate", &plans);
    if plans.is_empty() {
        return Ok(());
    }
    print_apply(&send(cfg, client, plans, dry_run).await);
    Ok(())
}

/// Deprecate all but the oldest of each group of same-named open tasks.
pub async fn dedupe(cfg: &Config, dry_run: bool) -> Result<()> {
    let client = cfg.notion_client()?;
    let tasks = client.query(&queries::all_open()).await.context("load open tasks")?;
    let plans = duplicate_deprecations(&tasks);
    print_plans("Duplicates", &plans);
    if plans.is_empty() {
        return Ok(());
    }
    print_apply(&send(cfg, client, plans, dry_run).await);
    Ok(())
}

/// Promote everything due within `days` days to must-be-done-today.
pub async fn escalate(cfg: &Config, days: u32, dry_run: bool) -> Result<()> {
    let tz = cfg.tz()?;
    let client = cfg.notion_client()?;
    let today = local_today(Utc::now(), tz);

    let tasks = client.query(&queries::due_from(today)).await.context("load upcoming tasks")?;
    let plans = escalations(&tasks, today, tz, days);
    print_plans("Escalations", &plans);
    if plans.is_empty() {
        return Ok(());
    }
    print_apply(&send(cfg, client, plans, dry_run).await);
    Ok(())
}

/// Pack each configured class of tasks into its matching calendar events.
pub fn align(cfg: &Config, tomorrow: bool, dry_run: bool) -> Result<()> {
    let tz = cfg.tz()?;
    let policy = cfg.policy();
    let store = open_store(cfg, dry_run)?;
    let calendar = GoogleCalendar::from_env(&cfg.calendar.token_env, cfg.calendar.calendar_ids.clone(), tz)?;

    let today = local_today(Utc::now(), tz);
    let day = if tomorrow { today + Duration::days(1) } else { today };
    let events = calendar.events_for_day(day).context("read calendar")?;

    for block in &cfg.calendar.class_blocks {
        let slots = events_matching(&events, &block.event_label);
        if slots.is_empty() {
            println!("{}: no \"{}\" events on {}", block.class, block.event_label, day);
            continue;
        }
        let tasks = store
            .query(&queries::class_due_on(&block.class, day))
            .with_context(|| format!("load {} tasks", block.class))?;
        let packing = pack_into_events(tasks, &slots, &policy);

        println!("{}: {} placed, {} left over", block.class, packing.placed.len(), packing.unplaced.len());
        for (task, window) in &packing.placed {
            let patch = TaskPatch::new().with_due(Due::window_in(*window, tz));
            match store.patch(&task.id, &patch) {
                Ok(()) => {
                    info!(task = %task.name, class = %block.class, "aligned");
                    println!(
                        "  {} - {}  {}",
                        window.start.with_timezone(&tz).format("%H:%M"),
                        window.end.with_timezone(&tz).format("%H:%M"),
                        task.name
                    );
                }
                Err(e) => error!(task = %task.name, error = %e, "alignment update failed"),
            }
        }
        for task in &packing.unplaced {
            println!("  (no room) {}", task.name);
        }
    }
    Ok(())
}
