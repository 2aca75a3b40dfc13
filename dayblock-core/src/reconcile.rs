//! Conflict reconciler: a one-time pre-pass over the store's time-boxed tasks.
//!
//! Every task involved in an overlapping pair loses its time window (it is
//! demoted to a date-only due). The in-memory kept set is then decided per pair
//! with priority binarized to high/low:
//!
//! - high + high: keep both
//! - high + low: drop the low one
//! - low + low: drop both
//!
//! A task is handled by the first pair that touches it; later pairs involving
//! an already-handled task do not re-run the tie-break. Chains of three or more
//! mutually overlapping tasks are therefore not fully resolved.

use std::collections::HashSet;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demotion {
    pub task_id: String,
    pub task_name: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Tasks that stay in the in-memory schedule, with their windows intact.
    pub kept: Vec<Task>,
    /// One entry per task that must be demoted in the store.
    pub demoted: Vec<Demotion>,
    /// Ids removed from the in-memory schedule by the tie-break.
    pub dropped: Vec<String>,
}

impl Reconciliation {
    pub fn has_conflicts(&self) -> bool {
        !self.demoted.is_empty()
    }
}

pub fn reconcile(tasks: Vec<Task>, tz: Tz) -> Reconciliation {
    let windows: Vec<_> = tasks.iter().map(Task::window).collect();

    let mut demoted_idx: Vec<usize> = Vec::new();
    let mut demoted_seen: HashSet<usize> = HashSet::new();
    let mut handled: HashSet<usize> = HashSet::new();
    let mut drop: HashSet<usize> = HashSet::new();

    for i in 0..tasks.len() {
        let Some(a) = windows[i] else { continue };
        for j in (i + 1)..tasks.len() {
            let Some(b) = windows[j] else { continue };
            if !a.overlaps(&b) {
                continue;
            }

            for idx in [i, j] {
                if demoted_seen.insert(idx) {
                    demoted_idx.push(idx);
                }
            }

            if handled.contains(&i) || handled.contains(&j) {
                continue;
            }
            handled.insert(i);
            handled.insert(j);

            match (tasks[i].priority.is_high(), tasks[j].priority.is_high()) {
                (true, true) => {}
                (true, false) => {
                    drop.insert(j);
                }
                (false, true) => {
                    drop.insert(i);
                }
                (false, false) => {
                    drop.insert(i);
                    drop.insert(j);
                }
            }
        }
    }

    let demoted = demoted_idx
        .iter()
        .filter_map(|&idx| {
            let t = &tasks[idx];
            let w = windows[idx]?;
            Some(Demotion {
                task_id: t.id.clone(),
                task_name: t.name.clone(),
                date: w.start.with_timezone(&tz).date_naive(),
            })
        })
        .collect();

    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for (idx, task) in tasks.into_iter().enumerate() {
        if drop.contains(&idx) {
            dropped.push(task.id);
        } else {
            kept.push(task);
        }
    }

    Reconciliation {
        kept,
        demoted,
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use crate::time::{at_local, parse_tz};

    fn tz() -> Tz {
        parse_tz("America/New_York").unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn boxed(id: &str, p: Priority, from: (u32, u32), to: (u32, u32)) -> Task {
        Task::new(id, id).with_priority(p).with_window(
            at_local(day(), from.0, from.1, tz()),
            at_local(day(), to.0, to.1, tz()),
        )
    }

    #[test]
    fn high_beats_low_and_both_are_demoted() {
        let a = boxed("A", Priority::High, (9, 0), (10, 0));
        let b = boxed("B", Priority::Low, (9, 30), (10, 30));

        let r = reconcile(vec![a, b], tz());
        let demoted: Vec<_> = r.demoted.iter().map(|d| d.task_id.as_str()).collect();
        assert_eq!(demoted, vec!["A", "B"]);
        assert!(r.demoted.iter().all(|d| d.date == day()));
        assert_eq!(r.dropped, vec!["B".to_string()]);
        assert_eq!(r.kept.len(), 1);
        assert_eq!(r.kept[0].id, "A");
    }

    #[test]
    fn two_high_tasks_are_both_kept() {
        let a = boxed("A", Priority::MustBeDoneToday, (9, 0), (10, 0));
        let b = boxed("B", Priority::High, (9, 30), (10, 30));
        let r = reconcile(vec![a, b], tz());
        assert_eq!(r.demoted.len(), 2);
        assert!(r.dropped.is_empty());
        assert_eq!(r.kept.len(), 2);
    }

    #[test]
    fn two_low_tasks_are_both_dropped() {
        let a = boxed("A", Priority::Low, (9, 0), (10, 0));
        let b = boxed("B", Priority::Medium, (9, 30), (10, 30));
        let r = reconcile(vec![a, b], tz());
        assert_eq!(r.dropped.len(), 2);
        assert!(r.kept.is_empty());
    }

    #[test]
    fn disjoint_tasks_are_untouched() {
        let a = boxed("A", Priority::Low, (9, 0), (10, 0));
        let b = boxed("B", Priority::Low, (10, 0), (11, 0));
        let r = reconcile(vec![a, b], tz());
        assert!(!r.has_conflicts());
        assert_eq!(r.kept.len(), 2);
    }

    #[test]
    fn first_pair_wins_for_chained_conflicts() {
        // A overlaps B, B overlaps C. (A, B) is decided first; (B, C) finds B
        // already handled, so C survives even though it is low.
        let a = boxed("A", Priority::High, (9, 0), (10, 0));
        let b = boxed("B", Priority::Low, (9, 30), (11, 0));
        let c = boxed("C", Priority::Low, (10, 30), (11, 30));

        let r = reconcile(vec![a, b, c], tz());
        assert_eq!(r.demoted.len(), 3);
        assert_eq!(r.dropped, vec!["B".to_string()]);
        let kept: Vec<_> = r.kept.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(kept, vec!["A", "C"]);
    }
}
