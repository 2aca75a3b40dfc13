//! One-at-a-time classification of unassigned tasks.

use tracing::{error, info};

use crate::store::{TaskPatch, TaskStore};
use crate::task::{Priority, Status, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriageChoice {
    Prioritize(Priority),
    Close(Status),
}

impl TriageChoice {
    /// `1` Low, `m` Medium, `2` High, `s` Someday, `c` Deprecated, `x` Done.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" => Some(TriageChoice::Prioritize(Priority::Low)),
            "m" => Some(TriageChoice::Prioritize(Priority::Medium)),
            "2" => Some(TriageChoice::Prioritize(Priority::High)),
            "s" => Some(TriageChoice::Prioritize(Priority::Someday)),
            "c" => Some(TriageChoice::Close(Status::Deprecated)),
            "x" => Some(TriageChoice::Close(Status::Done)),
            _ => None,
        }
    }

    pub fn patch(&self) -> TaskPatch {
        match *self {
            TriageChoice::Prioritize(p) => TaskPatch::new().with_priority(p),
            TriageChoice::Close(s) => TaskPatch::new().with_status(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageSummary {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

/// Offer each task to `choose`; `None` leaves it as it is.
pub fn triage<S, F>(store: &S, tasks: &[Task], mut choose: F) -> TriageSummary
where
    S: TaskStore + ?Sized,
    F: FnMut(&Task) -> Option<TriageChoice>,
{
    let mut summary = TriageSummary::default();
    for task in tasks {
        let Some(choice) = choose(task) else {
            info!(task = %task.name, "no valid choice, unchanged");
            summary.unchanged += 1;
            continue;
        };
        match store.patch(&task.id, &choice.patch()) {
            Ok(()) => {
                info!(task = %task.name, ?choice, "triaged");
                summary.updated += 1;
            }
            Err(e) => {
                error!(task = %task.name, error = %e, "triage update failed");
                summary.failed += 1;
            }
        }
    }
    summary
}
