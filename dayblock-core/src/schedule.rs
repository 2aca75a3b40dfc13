//! In-memory mirror of the day's time-boxed tasks.
//!
//! Starts as the store's current schedule and grows as the session commits
//! blocks. One owner at a time; the session driver passes it down by reference.

use crate::overlap::{self, Interval};
use crate::task::Task;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    tasks: Vec<Task>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only tasks that carry a full window.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        Self {
            tasks: tasks.into_iter().filter(|t| t.window().is_some()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Insert or replace by id. Tasks without a window are ignored.
    pub fn upsert(&mut self, task: Task) {
        if task.window().is_none() {
            return;
        }
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    pub fn rename(&mut self, id: &str, name: &str) {
        if let Some(t) = self.tasks.iter_mut().find(|t| t.id == id) {
            t.name = name.to_string();
        }
    }

    pub fn has_overlap(&self, candidate: &Interval) -> bool {
        overlap::has_overlap(candidate, &self.tasks)
    }

    /// Window of the first task (other than `exclude_id`) that intersects `candidate`.
    pub fn first_conflict(&self, candidate: &Interval, exclude_id: &str) -> Option<Interval> {
        overlap::first_conflict(candidate, &self.tasks, exclude_id).map(|(_, w)| w)
    }

    /// Busy intervals, in schedule order.
    pub fn busy(&self) -> Vec<Interval> {
        self.tasks.iter().filter_map(Task::window).collect()
    }

    /// Any two committed windows intersecting each other.
    pub fn has_internal_overlap(&self) -> bool {
        let busy = self.busy();
        busy.iter()
            .enumerate()
            .any(|(i, a)| busy[i + 1..].iter().any(|b| a.overlaps(b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn date_only_tasks_never_enter_the_schedule() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let timed = Task::new("a", "call").with_window(
            Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap(),
        );
        let dated = Task::new("b", "errand").with_date(day);

        let mut s = Schedule::from_tasks(vec![timed, dated.clone()]);
        assert_eq!(s.len(), 1);
        s.upsert(dated);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn upsert_replaces_and_rename_updates_copy() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 14, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        let mut s = Schedule::new();
        s.upsert(Task::new("a", "call").with_window(start, end));
        s.upsert(Task::new("a", "call mom").with_window(start, end));
        assert_eq!(s.len(), 1);
        assert_eq!(s.get("a").unwrap().name, "call mom");

        s.rename("a", "call dad");
        assert_eq!(s.get("a").unwrap().name, "call dad");
        assert!(s.remove("a").is_some());
        assert!(s.is_empty());
    }
}
