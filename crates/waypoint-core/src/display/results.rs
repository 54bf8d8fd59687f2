//! Result wrapper types for displaying operation outcomes.
//!
//! Each mutating [`crate::Planner`] operation returns one of these so the CLI
//! and the MCP server print the same confirmation text.

use std::{
    fmt,
    path::{Path, PathBuf},
};

use super::models::write_ids;
use crate::models::{Checkpoint, ProgressRecord, TaskId, TaskStatus};

/// How an existing progress state was carried into a regenerated plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    /// Records kept because their task id survived
    pub retained: usize,
    /// Task ids new to this plan
    pub added: Vec<TaskId>,
    /// Task ids the plan no longer contains
    pub dropped: Vec<TaskId>,
}

/// Outcome of compiling and storing a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileResult {
    pub project_name: String,
    pub phases: usize,
    pub total_tasks: usize,
    pub current_phase: u32,
    /// `None` when the plan was initialized from scratch
    pub reconciliation: Option<Reconciliation>,
}

impl fmt::Display for CompileResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Compiled plan **{}**: {} phases, {} tasks.",
            self.project_name, self.phases, self.total_tasks
        )?;
        writeln!(f)?;

        match &self.reconciliation {
            None => writeln!(f, "Progress initialized; every task is pending.")?,
            Some(reconciliation) => {
                writeln!(
                    f,
                    "Progress reconciled: {} task(s) kept their status.",
                    reconciliation.retained
                )?;
                if !reconciliation.added.is_empty() {
                    write!(f, "- Added: ")?;
                    write_ids(f, &reconciliation.added)?;
                    writeln!(f)?;
                }
                if !reconciliation.dropped.is_empty() {
                    write!(f, "- Dropped: ")?;
                    write_ids(f, &reconciliation.dropped)?;
                    writeln!(f)?;
                }
            }
        }
        writeln!(f, "- Current phase: {}", self.current_phase)
    }
}

/// Outcome of a task status change.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionResult {
    pub task_id: TaskId,
    pub title: String,
    pub from: TaskStatus,
    pub record: ProgressRecord,
    /// Dependencies that were not completed when the transition happened
    pub unmet_dependencies: Vec<TaskId>,
}

impl fmt::Display for TransitionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Task **{}** ({}): {} → {}",
            self.task_id,
            self.title,
            self.from.with_icon(),
            self.record.status.with_icon()
        )?;

        if let Some(notes) = &self.record.notes {
            writeln!(f)?;
            writeln!(f, "Notes: {notes}")?;
        }

        if !self.unmet_dependencies.is_empty() {
            writeln!(f)?;
            write!(f, "Warning: dependencies not yet completed: ")?;
            write_ids(f, &self.unmet_dependencies)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Outcome of recording a checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointResult {
    pub checkpoint: Checkpoint,
    /// Length of the trail including this entry
    pub total: usize,
}

impl fmt::Display for CheckpointResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Recorded checkpoint #{}:", self.total)?;
        writeln!(f)?;
        write!(f, "{}", self.checkpoint)
    }
}

/// Outcome of advancing to the next phase.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceResult {
    pub previous: u32,
    pub current: u32,
    pub name: String,
}

impl fmt::Display for AdvanceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            writeln!(f, "Advanced from phase {} to phase {}.", self.previous, self.current)
        } else {
            writeln!(
                f,
                "Advanced from phase {} to phase {}: {}.",
                self.previous, self.current, self.name
            )
        }
    }
}

/// Shown in place of a query result before any plan has been compiled.
#[derive(Debug, Clone, PartialEq)]
pub struct NoPlan {
    pub location: PathBuf,
}

impl NoPlan {
    pub fn new(location: &Path) -> Self {
        Self {
            location: location.to_path_buf(),
        }
    }
}

impl fmt::Display for NoPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "No plan has been initialized in `{}` yet.",
            self.location.display()
        )?;
        writeln!(f)?;
        writeln!(f, "Compile a plan document to start tracking progress.")
    }
}
