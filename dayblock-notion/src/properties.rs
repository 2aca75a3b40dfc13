use serde::{Deserialize, Serialize};

/// Column names in the task database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    pub name: String,
    /// A status-type column, like `status`.
    pub priority: String,
    pub status: String,
    pub done: String,
    pub due: String,
    /// Checkbox (or checkbox formula) marking time-boxed tasks.
    pub assigned_time: String,
    pub effort: String,
    pub class: String,
    /// Write the assigned-time checkbox alongside due changes. Leave off when
    /// the column is a formula over the due date.
    pub write_assigned_time: bool,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            name: "Name".to_string(),
            priority: "Priority".to_string(),
            status: "Status".to_string(),
            done: "Done".to_string(),
            due: "Due".to_string(),
            assigned_time: "Assigned time".to_string(),
            effort: "Level of Effort".to_string(),
            class: "Class".to_string(),
            write_assigned_time: false,
        }
    }
}
