//! Data models for plans, tasks and progress.
//!
//! The plan side ([`Plan`], [`Phase`], [`Task`]) is immutable once compiled.
//! The progress side ([`ProgressState`], [`ProgressRecord`], [`Checkpoint`])
//! is the only mutable state in the system, and it only changes through the
//! lifecycle methods on [`ProgressState`]. Display implementations live in
//! [`crate::display::models`].
//!
//! # Examples
//!
//! ```rust
//! use waypoint_core::{
//!     compiler::compile,
//!     models::{ProgressState, RawPhase, RawPlan, RawTask, TaskStatus},
//! };
//!
//! let raw = RawPlan {
//!     project_name: "Demo".to_string(),
//!     phases: vec![RawPhase {
//!         number: 1,
//!         name: "Setup".to_string(),
//!         tasks: vec![RawTask {
//!             id: "phase1-task1".to_string(),
//!             title: "Scaffold".to_string(),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     }],
//!     ..Default::default()
//! };
//!
//! let plan = compile(&raw).unwrap();
//! let mut state = ProgressState::initialize(&plan);
//! let id = "phase1-task1".parse().unwrap();
//! state.transition(&id, TaskStatus::Completed, None).unwrap();
//! assert_eq!(state.status(&id), Some(TaskStatus::Completed));
//! ```

pub mod plan;
pub mod progress;
pub mod raw;
pub mod status;
pub mod task_id;

#[cfg(test)]
mod tests;

pub use plan::{Phase, Plan, Task};
pub use progress::{Checkpoint, ProgressRecord, ProgressState};
pub use raw::{RawPhase, RawPlan, RawTask};
pub use status::TaskStatus;
pub use task_id::TaskId;
