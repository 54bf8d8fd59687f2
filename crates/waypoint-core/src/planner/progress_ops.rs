//! Progress operations for the Planner: transitions, checkpoints and phases.

use log::{info, warn};

use super::{load_context, Planner};
use crate::{
    display::{AdvanceResult, CheckpointResult, TransitionResult},
    error::{PlannerError, Result},
    models::{TaskId, TaskStatus},
    params::{AddCheckpoint, TransitionTask},
    store::ProgressStore,
};

fn transition(
    store: &dyn ProgressStore,
    id: &TaskId,
    status: TaskStatus,
    note: Option<String>,
) -> Result<TransitionResult> {
    let (plan, mut state) = load_context(store)?;
    let task = plan
        .task(id)
        .ok_or_else(|| PlannerError::UnknownTask { id: id.to_string() })?;

    let unmet_dependencies: Vec<TaskId> = task
        .dependencies
        .iter()
        .filter(|dep| state.status(dep) != Some(TaskStatus::Completed))
        .cloned()
        .collect();
    if !unmet_dependencies.is_empty() {
        warn!(
            "Task {id} moves to {status} with {} unfinished dependencies",
            unmet_dependencies.len()
        );
    }

    let from = state.status(id).unwrap_or_default();
    let record = state.transition(id, status, note)?.clone();
    store.save_state(&state)?;
    info!("Task {id}: {from} -> {status}");

    Ok(TransitionResult {
        task_id: task.id.clone(),
        title: task.title.clone(),
        from,
        record,
        unmet_dependencies,
    })
}

impl Planner {
    /// Marks a task as in progress.
    ///
    /// Starting a task whose dependencies are not completed is allowed but
    /// reported in the result and logged.
    ///
    /// # Errors
    ///
    /// `PlannerError::UnknownTask` for ids outside the plan and
    /// `PlannerError::IllegalTransition` unless the task is pending.
    pub async fn start_task(&self, params: &TransitionTask) -> Result<TransitionResult> {
        let id = params.parse_task_id()?;
        let note = params.note.clone();
        self.with_store(move |store| transition(store, &id, TaskStatus::InProgress, note))
            .await
    }

    /// Marks a task as completed, from either pending or in progress.
    pub async fn complete_task(&self, params: &TransitionTask) -> Result<TransitionResult> {
        let id = params.parse_task_id()?;
        let note = params.note.clone();
        self.with_store(move |store| transition(store, &id, TaskStatus::Completed, note))
            .await
    }

    /// Appends an entry to the checkpoint trail.
    ///
    /// The phase defaults to the phase containing the task.
    pub async fn add_checkpoint(&self, params: &AddCheckpoint) -> Result<CheckpointResult> {
        let id = params.parse_task_id()?;
        let summary = params.summary.clone();
        let phase = params.phase;

        self.with_store(move |store| {
            let (plan, mut state) = load_context(store)?;
            let task = plan
                .task(&id)
                .ok_or_else(|| PlannerError::UnknownTask { id: id.to_string() })?;
            let phase = phase.unwrap_or(task.phase_number);
            if plan.phase(phase).is_none() {
                return Err(PlannerError::PhaseNotFound { phase });
            }

            let checkpoint = state
                .append_checkpoint(phase, task.id.as_str(), summary)?
                .clone();
            store.save_state(&state)?;

            Ok(CheckpointResult {
                checkpoint,
                total: state.checkpoints.len(),
            })
        })
        .await
    }

    /// Moves to the next phase once every task of the current one is done.
    pub async fn advance_phase(&self) -> Result<AdvanceResult> {
        self.with_store(|store| {
            let (plan, mut state) = load_context(store)?;
            let previous = state.current_phase;
            let current = state.advance_phase(&plan)?;
            store.save_state(&state)?;
            info!("Advanced from phase {previous} to phase {current}");

            Ok(AdvanceResult {
                previous,
                current,
                name: plan
                    .phase(current)
                    .map(|phase| phase.name.clone())
                    .unwrap_or_default(),
            })
        })
        .await
    }
}
