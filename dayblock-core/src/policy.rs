//! Time-block policy: how long a task's block is.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::task::{Effort, Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockPolicy {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub must_be_done_today: u32,
    pub effort_low: u32,
    pub effort_medium: u32,
    pub effort_high: u32,
    /// Fallback for priorities with no block of their own.
    pub default: u32,
    /// Size by effort classification when the task carries one.
    pub size_by_effort: bool,
}

impl Default for BlockPolicy {
    fn default() -> Self {
        Self {
            low: 15,
            medium: 30,
            high: 60,
            must_be_done_today: 120,
            effort_low: 15,
            effort_medium: 30,
            effort_high: 60,
            default: 30,
            size_by_effort: false,
        }
    }
}

impl BlockPolicy {
    pub fn minutes_for_priority(&self, priority: Priority) -> u32 {
        match priority {
            Priority::Low => self.low,
            Priority::Medium => self.medium,
            Priority::High => self.high,
            Priority::MustBeDoneToday => self.must_be_done_today,
            Priority::Unassigned | Priority::Someday => self.default,
        }
    }

    pub fn minutes_for_effort(&self, effort: Effort) -> u32 {
        match effort {
            Effort::Low => self.effort_low,
            Effort::Medium => self.effort_medium,
            Effort::High => self.effort_high,
        }
    }

    pub fn minutes_for(&self, task: &Task) -> u32 {
        match task.effort {
            Some(effort) if self.size_by_effort => self.minutes_for_effort(effort),
            _ => self.minutes_for_priority(task.priority),
        }
    }

    pub fn length_for(&self, task: &Task) -> Duration {
        Duration::minutes(self.minutes_for(task).into())
    }
}
