//! Compiled plan model: phases, tasks and their dependencies.

use serde::Serialize;

use super::{RawPhase, RawPlan, RawTask, TaskId};

/// A validated, immutable plan.
///
/// Plans produced by [`crate::compiler::compile`] have phases numbered
/// `1..=n`, unique task ids, resolvable dependencies and an acyclic dependency
/// graph. Persisted plans are read back as [`RawPlan`] and recompiled rather
/// than deserialized directly.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub project_name: String,
    pub summary: String,
    pub goals: Vec<String>,
    pub phases: Vec<Phase>,
    /// Sum of the per-phase task counts
    pub total_tasks: usize,
}

/// An ordered group of tasks representing a milestone.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub number: u32,
    pub name: String,
    pub description: String,
    pub entry_criteria: Vec<String>,
    pub exit_criteria: Vec<String>,
    pub tasks: Vec<Task>,
}

/// A unit of work inside a phase.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    /// Number of the phase containing this task
    pub phase_number: u32,
    /// De-duplicated dependency ids in declaration order
    pub dependencies: Vec<TaskId>,
    /// No ordering requirement against siblings beyond `dependencies`
    pub parallelizable: bool,
}

impl Plan {
    /// Looks up a phase by its number.
    pub fn phase(&self, number: u32) -> Option<&Phase> {
        // phases are numbered 1..=n in order
        number
            .checked_sub(1)
            .and_then(|i| self.phases.get(i as usize))
    }

    /// Looks up a task anywhere in the plan.
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.phase(id.phase())
            .and_then(|phase| phase.tasks.iter().find(|task| &task.id == id))
    }

    /// Iterates over every task in phase then declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.phases.iter().flat_map(|phase| phase.tasks.iter())
    }

    /// Number of the last phase.
    pub fn last_phase(&self) -> u32 {
        self.phases.last().map_or(0, |phase| phase.number)
    }
}

impl From<&Plan> for RawPlan {
    /// Lowers a compiled plan back to compiler input, used when a persisted
    /// plan is reloaded and recompiled.
    fn from(plan: &Plan) -> Self {
        RawPlan {
            project_name: plan.project_name.clone(),
            summary: plan.summary.clone(),
            goals: plan.goals.clone(),
            phases: plan
                .phases
                .iter()
                .map(|phase| RawPhase {
                    number: phase.number,
                    name: phase.name.clone(),
                    description: phase.description.clone(),
                    entry_criteria: phase.entry_criteria.clone(),
                    exit_criteria: phase.exit_criteria.clone(),
                    tasks: phase
                        .tasks
                        .iter()
                        .map(|task| RawTask {
                            id: task.id.to_string(),
                            title: task.title.clone(),
                            description: task.description.clone(),
                            dependencies: task.dependencies.iter().map(ToString::to_string).collect(),
                            parallelizable: task.parallelizable,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
