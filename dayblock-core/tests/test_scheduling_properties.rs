use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use dayblock_core::time::at_local;
use dayblock_core::{
    free_blocks, parse_tz, BlockPolicy, Decision, MemoryStore, Priority, Schedule, ScheduleWindow, SchedulerContext,
    ScriptedOperator, Session, SessionFlags, Task,
};
use proptest::prelude::*;

fn tz() -> Tz {
    parse_tz("America/New_York").unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

fn at(h: u32, m: u32) -> DateTime<Utc> {
    at_local(day(), h, m, tz()).with_timezone(&Utc)
}

fn priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
        Just(Priority::MustBeDoneToday),
        Just(Priority::Unassigned),
    ]
}

/// Existing blocks as (start offset in quarter hours from 09:00, length in quarter hours).
fn existing_blocks() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0u32..40, 1u32..8), 0..6)
}

fn build_schedule(blocks: &[(u32, u32)]) -> Schedule {
    // Lay the generated blocks end to end so the starting schedule is itself
    // conflict-free.
    let mut cursor = at(9, 0);
    let mut tasks = Vec::new();
    for (i, (gap, len)) in blocks.iter().enumerate() {
        let start = cursor + Duration::minutes(15 * i64::from(*gap % 4));
        let end = start + Duration::minutes(15 * i64::from(*len));
        tasks.push(Task::new(format!("existing-{i}"), format!("existing-{i}")).with_window(start, end));
        cursor = end;
    }
    Schedule::from_tasks(tasks)
}

proptest! {
    #[test]
    fn committed_blocks_never_overlap_and_match_policy(
        priorities in prop::collection::vec(priority(), 1..10),
        blocks in existing_blocks(),
        start_quarter in 0u32..20,
    ) {
        let schedule = build_schedule(&blocks);
        prop_assume!(!schedule.has_internal_overlap());

        let tasks: Vec<Task> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| Task::new(format!("t{i}"), format!("task {i}")).with_priority(*p).with_date(day()))
            .collect();
        let store = MemoryStore::with_tasks(tz(), tasks.clone());
        let ctx = SchedulerContext::new(tz(), day(), at(8, 0));
        let policy = BlockPolicy::default();
        let cursor = at(9, 0) + Duration::minutes(15 * i64::from(start_quarter));

        let mut op = ScriptedOperator::new(vec![Decision::Apply; tasks.len()]);
        let mut session = Session::with_schedule(&store, ctx, cursor, schedule);
        session.flags_mut().allow_late_night = true;
        let report = session.run(tasks.clone(), &mut op);

        prop_assert!(!report.schedule.has_internal_overlap());
        for commit in &report.committed {
            let task = tasks.iter().find(|t| t.id == commit.task_id).unwrap();
            prop_assert!(commit.window.start <= commit.window.end);
            prop_assert_eq!(commit.window.length(), policy.length_for(task));
            prop_assert!(commit.window.start >= cursor);
        }
        prop_assert_eq!(report.committed.len(), tasks.len());
    }

    #[test]
    fn cursor_never_moves_backwards(
        priorities in prop::collection::vec(priority(), 1..8),
        decisions in prop::collection::vec(
            prop_oneof![
                Just(Decision::Apply),
                Just(Decision::DeferTomorrow),
                Just(Decision::MarkDone),
                Just(Decision::PromoteHigh),
            ],
            8,
        ),
    ) {
        let tasks: Vec<Task> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| Task::new(format!("t{i}"), format!("task {i}")).with_priority(*p).with_date(day()))
            .collect();
        let store = MemoryStore::with_tasks(tz(), tasks.clone());
        let ctx = SchedulerContext::new(tz(), day(), at(8, 0));
        let mut op = ScriptedOperator::new(decisions);

        let mut session = Session::with_schedule(&store, ctx, at(9, 0), Schedule::new());
        session.flags_mut().allow_late_night = true;
        let report = session.run(tasks, &mut op);

        let mut last = at(9, 0);
        for commit in &report.committed {
            prop_assert!(commit.window.start >= last);
            last = commit.window.end;
        }
        prop_assert!(report.cursor.unwrap_or(last) >= last);
    }

    #[test]
    fn free_blocks_are_stable_and_disjoint_from_busy(
        blocks in existing_blocks(),
        now_quarter in 0u32..60,
    ) {
        let schedule = build_schedule(&blocks);
        let window = ScheduleWindow::default();
        let now = at(8, 0) + Duration::minutes(15 * i64::from(now_quarter));

        let first = free_blocks(&schedule, &window, day(), now, tz());
        let second = free_blocks(&schedule, &window, day(), now, tz());
        prop_assert_eq!(&first, &second);

        for free in &first {
            prop_assert!(free.start < free.end);
            prop_assert!(free.start >= now);
            prop_assert!(!schedule.has_overlap(free));
        }
    }
}
