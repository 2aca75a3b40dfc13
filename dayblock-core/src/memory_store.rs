//! In-process task store with the same filter semantics as the remote one.

use std::sync::{Mutex, MutexGuard};

use chrono_tz::Tz;

use crate::store::{sort_tasks, StoreError, TaskDraft, TaskPatch, TaskQuery, TaskStore};
use crate::task::Task;

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    patches: Vec<(String, TaskPatch)>,
    created: Vec<String>,
    fail_writes: bool,
    next_id: usize,
}

#[derive(Debug)]
pub struct MemoryStore {
    tz: Tz,
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn with_tasks(tz: Tz, tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new(tz);
        if let Ok(mut inner) = store.inner.lock() {
            inner.tasks = tasks.into_iter().collect();
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Request("memory store lock poisoned".into()))
    }

    /// Make every subsequent patch and create fail, to exercise error paths.
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail_writes = fail;
        }
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let inner = self.inner.lock().ok()?;
        inner.tasks.iter().find(|t| t.id == id).cloned()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.inner.lock().map(|i| i.tasks.clone()).unwrap_or_default()
    }

    /// Every successful patch, in order.
    pub fn patches(&self) -> Vec<(String, TaskPatch)> {
        self.inner.lock().map(|i| i.patches.clone()).unwrap_or_default()
    }

    pub fn patches_for(&self, id: &str) -> Vec<TaskPatch> {
        self.patches()
            .into_iter()
            .filter(|(pid, _)| pid == id)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn created(&self) -> Vec<String> {
        self.inner.lock().map(|i| i.created.clone()).unwrap_or_default()
    }
}

impl TaskStore for MemoryStore {
    fn query(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let inner = self.lock()?;
        let mut hits: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| query.filter.matches(t, self.tz))
            .cloned()
            .collect();
        sort_tasks(&mut hits, &query.sorts);
        Ok(hits)
    }

    fn patch(&self, task_id: &str, patch: &TaskPatch) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.fail_writes {
            return Err(StoreError::Rejected {
                status: 503,
                body: "writes disabled".into(),
            });
        }
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
        patch.apply_to(task);
        inner.patches.push((task_id.to_string(), patch.clone()));
        Ok(())
    }

    fn create(&self, draft: &TaskDraft) -> Result<String, StoreError> {
        let mut inner = self.lock()?;
        if inner.fail_writes {
            return Err(StoreError::Rejected {
                status: 503,
                body: "writes disabled".into(),
            });
        }
        inner.next_id += 1;
        let id = format!("mem-{}", inner.next_id);
        let mut task = Task::new(id.clone(), draft.name.clone()).with_priority(draft.priority);
        task.class = draft.class.clone();
        if let Some(due) = draft.due {
            task.assigned_time = due.is_timed();
            task.due = Some(due);
        }
        inner.tasks.push(task);
        inner.created.push(id.clone());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Filter, Sort};
    use crate::task::{Priority, Status};
    use crate::time::parse_tz;

    #[test]
    fn query_filters_and_sorts() {
        let tz = parse_tz("America/New_York").unwrap();
        let store = MemoryStore::with_tasks(
            tz,
            vec![
                Task::new("1", "a").with_priority(Priority::Low),
                Task::new("2", "b").with_priority(Priority::High),
                Task::new("3", "c").with_status(Status::Deprecated),
            ],
        );
        let q = TaskQuery::new(Filter::StatusIsNot(Status::Deprecated)).sorted_by(Sort::PriorityAscending);
        let ids: Vec<_> = store.query(&q).unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn patch_unknown_task_is_not_found() {
        let store = MemoryStore::new(parse_tz("UTC").unwrap());
        let err = store.patch("nope", &TaskPatch::new().with_priority(Priority::High));
        assert!(matches!(err, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn failed_writes_leave_tasks_untouched() {
        let store = MemoryStore::with_tasks(parse_tz("UTC").unwrap(), vec![Task::new("1", "a")]);
        store.fail_writes(true);
        assert!(store.patch("1", &TaskPatch::new().with_name("b")).is_err());
        assert_eq!(store.get("1").unwrap().name, "a");
        assert!(store.patches().is_empty());
    }

    #[test]
    fn create_assigns_fresh_ids() {
        let store = MemoryStore::new(parse_tz("UTC").unwrap());
        let a = store.create(&TaskDraft::new("Schedule Day", Priority::High).with_class("Admin")).unwrap();
        let b = store.create(&TaskDraft::new("other", Priority::Low)).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get(&a).unwrap().class.as_deref(), Some("Admin"));
    }
}
