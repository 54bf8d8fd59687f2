//! High-level planner API.
//!
//! [`Planner`] ties the compiler, the resolver and the progress state machine
//! to a [`ProgressStore`]. Every operation loads the current plan and state,
//! applies one change, and writes the result back before returning, so the
//! persisted state is always the state the caller last saw.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  CLI / MCP      │    │    Planner      │    │  ProgressStore  │
//! │  (waypoint-cli) │───▶│ (plan_ops,      │───▶│ (file / sqlite) │
//! │                 │    │  progress_ops)  │    │                 │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! The stores are synchronous. Operations run them on tokio's blocking pool,
//! which keeps the MCP server responsive while a save is in flight.
//!
//! # Usage
//!
//! ```rust,no_run
//! use waypoint_core::{models::RawPlan, PlannerBuilder};
//!
//! # async fn example(raw: RawPlan) -> waypoint_core::Result<()> {
//! let planner = PlannerBuilder::new()
//!     .with_state_dir(Some(".waypoint"))
//!     .build()
//!     .await?;
//!
//! planner.compile_plan(raw).await?;
//! println!("{}", planner.next_task().await?);
//! # Ok(())
//! # }
//! ```

use std::{collections::BTreeSet, sync::Arc};

use log::warn;
use tokio::task;

use crate::{
    error::{PlannerError, Result},
    models::{Plan, ProgressState, TaskId},
    store::ProgressStore,
};

pub mod builder;
pub mod plan_ops;
pub mod progress_ops;


pub use builder::PlannerBuilder;

/// Main planner interface for one project's plan and progress.
#[derive(Clone)]
pub struct Planner {
    pub(crate) store: Arc<dyn ProgressStore>,
}

impl Planner {
    pub(crate) fn new(store: Arc<dyn ProgressStore>) -> Self {
        Self { store }
    }

    /// Where the plan and progress are stored.
    pub fn location(&self) -> &std::path::Path {
        self.store.location()
    }

    /// Runs `op` against the store on the blocking thread pool.
    pub(crate) async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn ProgressStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| PlannerError::Configuration {
                message: format!("Task join error: {e}"),
            })?
    }
}

/// Loads the plan and its progress state.
///
/// # Errors
///
/// Returns [`PlannerError::StateNotFound`] when no plan or no state has been
/// stored yet, and [`PlannerError::StateMismatch`] when the state tracks other
/// task ids than the plan. The stored state is left untouched in that case;
/// compiling a plan again reconciles it.
pub(crate) fn load_context(store: &dyn ProgressStore) -> Result<(Plan, ProgressState)> {
    let not_found = || PlannerError::StateNotFound {
        location: store.location().to_path_buf(),
    };
    let plan = store.load_plan()?.ok_or_else(not_found)?;
    let state = store.load_state()?.ok_or_else(not_found)?;

    let plan_ids: BTreeSet<&TaskId> = plan.tasks().map(|task| &task.id).collect();
    let state_ids: BTreeSet<&TaskId> = state.tasks.keys().collect();
    if plan_ids == state_ids {
        return Ok((plan, state));
    }

    warn!(
        "Progress at {} does not match the stored plan",
        store.location().display()
    );
    Err(PlannerError::StateMismatch {
        location: store.location().to_path_buf(),
    })
}
