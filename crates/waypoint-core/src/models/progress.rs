//! Progress state: per-task records, checkpoints and the status lifecycle.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{Plan, TaskId, TaskStatus};
use crate::error::{PlannerError, Result};

/// Mutable run-time state of a single task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub status: TaskStatus,

    /// Set only on the transition into `completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub phase: u32,
    pub task: String,
    pub summary: String,
    pub created_at: Timestamp,
}

/// The aggregate persisted progress of a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    /// Phase actively being worked; advanced explicitly
    pub current_phase: u32,

    pub tasks: BTreeMap<TaskId, ProgressRecord>,

    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,

    pub last_updated: Timestamp,
}

impl ProgressState {
    /// Creates a fresh state with one `pending` record per task in `plan`.
    pub fn initialize(plan: &Plan) -> Self {
        Self {
            current_phase: 1,
            tasks: plan
                .tasks()
                .map(|task| (task.id.clone(), ProgressRecord::default()))
                .collect(),
            checkpoints: Vec::new(),
            last_updated: Timestamp::now(),
        }
    }

    /// Status of a task, if it has a record.
    pub fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.tasks.get(id).map(|record| record.status)
    }

    /// Moves a task forward through its lifecycle.
    ///
    /// The state is left untouched when the id is unknown or the move is not
    /// one of `pending -> in_progress`, `in_progress -> completed` or
    /// `pending -> completed`. A supplied note replaces the record's notes.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::UnknownTask`] or
    /// [`PlannerError::IllegalTransition`].
    pub fn transition(
        &mut self,
        id: &TaskId,
        status: TaskStatus,
        note: Option<String>,
    ) -> Result<&ProgressRecord> {
        let record = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| PlannerError::UnknownTask { id: id.to_string() })?;

        if !record.status.can_transition_to(status) {
            return Err(PlannerError::IllegalTransition {
                task: id.to_string(),
                from: record.status,
                to: status,
            });
        }

        let now = Timestamp::now();
        record.status = status;
        if status == TaskStatus::Completed {
            record.completed_at = Some(now);
        }
        if note.is_some() {
            record.notes = note;
        }
        self.last_updated = now;

        Ok(record)
    }

    /// Appends an entry to the checkpoint trail. Earlier entries are never
    /// rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidInput`] when `summary` is blank.
    pub fn append_checkpoint(
        &mut self,
        phase: u32,
        task: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<&Checkpoint> {
        let summary = summary.into();
        if summary.trim().is_empty() {
            return Err(PlannerError::invalid_input("summary").with_reason("must not be empty"));
        }

        let now = Timestamp::now();
        self.checkpoints.push(Checkpoint {
            phase,
            task: task.into(),
            summary,
            created_at: now,
        });
        self.last_updated = now;

        Ok(&self.checkpoints[self.checkpoints.len() - 1])
    }

    /// Merges this state into a regenerated plan.
    ///
    /// Records of task ids the new plan keeps are carried forward unchanged,
    /// new ids start as `pending` and ids the plan no longer contains are
    /// dropped. `current_phase` and the checkpoint trail carry forward.
    pub fn reconcile(&self, plan: &Plan) -> ProgressState {
        let tasks = plan
            .tasks()
            .map(|task| {
                let record = self.tasks.get(&task.id).cloned().unwrap_or_default();
                (task.id.clone(), record)
            })
            .collect();

        ProgressState {
            current_phase: self.current_phase,
            tasks,
            checkpoints: self.checkpoints.clone(),
            last_updated: Timestamp::now(),
        }
    }

    /// Advances `current_phase` once every task of the current phase is
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::PhaseNotFound`] if the current phase is not in
    /// `plan`, [`PlannerError::PhaseIncomplete`] while tasks remain and
    /// [`PlannerError::NoNextPhase`] on the final phase.
    pub fn advance_phase(&mut self, plan: &Plan) -> Result<u32> {
        let phase = plan
            .phase(self.current_phase)
            .ok_or(PlannerError::PhaseNotFound {
                phase: self.current_phase,
            })?;

        let remaining = phase
            .tasks
            .iter()
            .filter(|task| self.status(&task.id) != Some(TaskStatus::Completed))
            .count();
        if remaining > 0 {
            return Err(PlannerError::PhaseIncomplete {
                phase: phase.number,
                remaining,
            });
        }

        if phase.number >= plan.last_phase() {
            return Err(PlannerError::NoNextPhase {
                phase: phase.number,
            });
        }

        self.current_phase = phase.number + 1;
        self.last_updated = Timestamp::now();
        Ok(self.current_phase)
    }
}
