//! Dependency resolver: what can be worked on next.
//!
//! Every function here is a pure read over an immutable [`Plan`] and a
//! snapshot of [`ProgressState`]. Nothing is cached between calls, so the
//! resolver can be queried repeatedly and from several threads as long as
//! each caller supplies a consistent snapshot.

use serde::Serialize;

use crate::{
    error::{PlannerError, Result},
    models::{Phase, Plan, ProgressState, Task, TaskId, TaskStatus},
};

/// Answer to "what should be worked on next" for the current phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NextTask {
    /// The first eligible task of the phase, in declaration order
    Next {
        task_id: TaskId,
        title: String,
        description: String,
        dependencies: Vec<TaskId>,
    },
    /// Every task of the phase is completed; the caller should advance
    PhaseComplete { phase: u32, last_phase: bool },
    /// Nothing is eligible. `blocked` lists pending tasks with the
    /// dependencies they still wait on; it is empty when the only remaining
    /// work is already in progress.
    Blocked {
        in_progress: Vec<TaskId>,
        blocked: Vec<BlockedTask>,
    },
}

/// A pending task that cannot start yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTask {
    pub task_id: TaskId,
    pub unmet_dependencies: Vec<TaskId>,
}

/// Task counts for one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    /// Completed share in whole percent.
    pub fn percent_complete(&self) -> usize {
        if self.total == 0 {
            0
        } else {
            self.completed * 100 / self.total
        }
    }

    fn record(&mut self, status: TaskStatus) {
        self.total += 1;
        match status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
        }
    }
}

/// Progress of one phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseProgress {
    pub number: u32,
    pub name: String,
    pub counts: StatusCounts,
}

/// Progress of the whole plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub project_name: String,
    pub current_phase: u32,
    pub phases: Vec<PhaseProgress>,
    pub overall: StatusCounts,
}

/// Status used for resolution; tasks without a record count as pending.
fn status_of(state: &ProgressState, id: &TaskId) -> TaskStatus {
    state.status(id).unwrap_or_default()
}

/// Dependencies of `task` that are not yet completed. A dependency without a
/// record is unmet.
fn unmet_dependencies(task: &Task, state: &ProgressState) -> Vec<TaskId> {
    task.dependencies
        .iter()
        .filter(|dep| state.status(dep) != Some(TaskStatus::Completed))
        .cloned()
        .collect()
}

fn current_phase<'a>(plan: &'a Plan, state: &ProgressState) -> Result<&'a Phase> {
    plan.phase(state.current_phase)
        .ok_or(PlannerError::PhaseNotFound {
            phase: state.current_phase,
        })
}

/// Computes the next actionable task in `state.current_phase`.
///
/// Dependencies in other phases are checked against the same global state,
/// so a task waiting on unfinished work from an earlier phase stays blocked
/// after the phase has been advanced.
///
/// # Errors
///
/// Returns [`PlannerError::PhaseNotFound`] when the current phase does not
/// exist in `plan`.
pub fn next_task(plan: &Plan, state: &ProgressState) -> Result<NextTask> {
    let phase = current_phase(plan, state)?;

    let mut in_progress = Vec::new();
    let mut blocked = Vec::new();
    for task in &phase.tasks {
        match status_of(state, &task.id) {
            TaskStatus::Completed => {}
            TaskStatus::InProgress => in_progress.push(task.id.clone()),
            TaskStatus::Pending => {
                let unmet = unmet_dependencies(task, state);
                if unmet.is_empty() {
                    return Ok(NextTask::Next {
                        task_id: task.id.clone(),
                        title: task.title.clone(),
                        description: task.description.clone(),
                        dependencies: task.dependencies.clone(),
                    });
                }
                blocked.push(BlockedTask {
                    task_id: task.id.clone(),
                    unmet_dependencies: unmet,
                });
            }
        }
    }

    if in_progress.is_empty() && blocked.is_empty() {
        return Ok(NextTask::PhaseComplete {
            phase: phase.number,
            last_phase: phase.number == plan.last_phase(),
        });
    }

    Ok(NextTask::Blocked {
        in_progress,
        blocked,
    })
}

/// Whether every task of `phase` is completed.
///
/// # Errors
///
/// Returns [`PlannerError::PhaseNotFound`] for a phase absent from `plan`.
pub fn is_phase_complete(plan: &Plan, state: &ProgressState, phase: u32) -> Result<bool> {
    let phase = plan
        .phase(phase)
        .ok_or(PlannerError::PhaseNotFound { phase })?;

    Ok(phase
        .tasks
        .iter()
        .all(|task| status_of(state, &task.id) == TaskStatus::Completed))
}

/// Per-phase and overall status counts.
pub fn summarize(plan: &Plan, state: &ProgressState) -> ProgressSummary {
    let mut overall = StatusCounts::default();
    let phases = plan
        .phases
        .iter()
        .map(|phase| {
            let mut counts = StatusCounts::default();
            for task in &phase.tasks {
                let status = status_of(state, &task.id);
                counts.record(status);
                overall.record(status);
            }
            PhaseProgress {
                number: phase.number,
                name: phase.name.clone(),
                counts,
            }
        })
        .collect();

    ProgressSummary {
        project_name: plan.project_name.clone(),
        current_phase: state.current_phase,
        phases,
        overall,
    }
}
