//! dayblock-core: greedy time-block planning over an external task store

pub mod align;
pub mod clock;
pub mod decision;
pub mod free_blocks;
pub mod maintenance;
pub mod memory_store;
pub mod overlap;
pub mod policy;
pub mod queries;
pub mod reconcile;
pub mod schedule;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod task;
pub mod time;
pub mod triage;

pub use align::{events_matching, pack_into_events, CalendarEvent, CalendarSource, ClassBlock, Packing};
pub use clock::{parse_clock, parse_day};
pub use decision::{CutoffChoice, Decision, Operator, Proposal, ScriptedOperator};
pub use free_blocks::{free_blocks, total_free};
pub use maintenance::{apply_all, duplicate_deprecations, escalations, overdue_to_today, ApplyReport, PlannedPatch};
pub use memory_store::MemoryStore;
pub use overlap::{has_overlap, Interval};
pub use policy::BlockPolicy;
pub use reconcile::{reconcile, Demotion, Reconciliation};
pub use schedule::Schedule;
pub use scheduler::{schedule_task, Commit, Outcome, SchedulerContext, SessionFlags, SessionState};
pub use session::{partition, Session, SessionReport};
pub use store::{DryRunStore, Filter, Sort, StoreError, TaskDraft, TaskPatch, TaskQuery, TaskStore};
pub use task::{Due, Effort, Priority, Status, Task, UNNAMED_TASK};
pub use time::{ceil_to_half_hour, local_today, parse_tz, session_start, ScheduleWindow};
pub use triage::{triage, TriageChoice, TriageSummary};
