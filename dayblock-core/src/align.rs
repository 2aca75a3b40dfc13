//! Calendar alignment: pack a class of tasks into matching calendar events.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::overlap::Interval;
use crate::policy::BlockPolicy;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Read-only source of a day's busy events.
pub trait CalendarSource {
    fn events_for_day(&self, day: NaiveDate) -> Result<Vec<CalendarEvent>>;
}

/// Tasks of `class` go into events whose summary contains `event_label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassBlock {
    pub event_label: String,
    pub class: String,
}

/// Events whose summary contains `label` (case-insensitive), earliest first.
pub fn events_matching<'a>(events: &'a [CalendarEvent], label: &str) -> Vec<&'a CalendarEvent> {
    let needle = label.to_lowercase();
    let mut hits: Vec<_> = events
        .iter()
        .filter(|e| e.summary.to_lowercase().contains(&needle) && e.end > e.start)
        .collect();
    hits.sort_by_key(|e| e.start);
    hits
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Packing {
    pub placed: Vec<(Task, Interval)>,
    pub unplaced: Vec<Task>,
}

/// Place each task, in order, at the first event with room left for it.
///
/// Blocks within an event are laid back to back from its start. A task that
/// fits no event is left unplaced and does not use up space for later tasks.
pub fn pack_into_events(tasks: Vec<Task>, events: &[&CalendarEvent], policy: &BlockPolicy) -> Packing {
    let mut packing = Packing::default();
    let slots: Vec<Interval> = events.iter().map(|e| e.interval()).collect();
    let mut cursors: Vec<DateTime<Utc>> = slots.iter().map(|s| s.start).collect();

    for task in tasks {
        let length = policy.length_for(&task);
        let fit = slots
            .iter()
            .zip(cursors.iter_mut())
            .map(|(slot, cursor)| (Interval::starting_at(*cursor, length), slot, cursor))
            .find(|(block, slot, _)| block.end <= slot.end);
        match fit {
            Some((block, _, cursor)) => {
                *cursor = block.end;
                packing.placed.push((task, block));
            }
            None => packing.unplaced.push(task),
        }
    }
    packing
}
