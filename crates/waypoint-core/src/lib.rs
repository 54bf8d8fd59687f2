//! Core library for Waypoint.
//!
//! Waypoint turns a generated project plan into a validated, dependency
//! ordered set of tasks and tracks their completion across work sessions.
//!
//! - [`compiler`] validates a [`models::RawPlan`] into an immutable
//!   [`models::Plan`].
//! - [`resolver`] answers "what next?" for a plan and a progress snapshot.
//! - [`models::ProgressState`] is the task lifecycle state machine.
//! - [`store`] persists plan and progress atomically (JSON files or SQLite).
//! - [`adapter`] and [`generate`] turn generator text into compiler input.
//! - [`Planner`] combines all of the above behind an async API used by the
//!   CLI and the MCP server.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use waypoint_core::{adapter::parse_plan_text, params::TransitionTask, PlannerBuilder};
//!
//! # async fn example(text: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let planner = PlannerBuilder::new()
//!     .with_state_dir(Some(".waypoint"))
//!     .build()
//!     .await?;
//!
//! planner.compile_plan(parse_plan_text(text)?).await?;
//! println!("{}", planner.next_task().await?);
//!
//! planner
//!     .complete_task(&TransitionTask {
//!         task_id: "phase1-task1".to_string(),
//!         note: Some("Scaffolded the workspace".to_string()),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod compiler;
pub mod display;
pub mod error;
pub mod generate;
pub mod models;
pub mod params;
pub mod planner;
pub mod resolver;
pub mod store;

// Re-export commonly used types
pub use compiler::{compile, topological_order};
pub use display::{
    AdvanceResult, CheckpointResult, Checkpoints, CompileResult, NoPlan, PlanOverview,
    TransitionResult,
};
pub use error::{CompileError, PlannerError, Result};
pub use generate::{PlanGenerator, PlanRequest, ResearchProvider};
pub use models::{
    Checkpoint, Phase, Plan, ProgressRecord, ProgressState, RawPhase, RawPlan, RawTask, Task,
    TaskId, TaskStatus,
};
pub use params::{AddCheckpoint, TransitionTask};
pub use planner::{Planner, PlannerBuilder};
pub use resolver::{NextTask, ProgressSummary};
pub use store::{FileStore, ProgressStore, SqliteStore, StoreKind};
