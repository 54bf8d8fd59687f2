//! Views combining the plan with its progress state.

use std::{fmt, ops::Index};

use crate::models::{Checkpoint, Plan, ProgressState, TaskStatus};

/// Newtype wrapper for displaying the checkpoint trail.
///
/// Entries are shown oldest first, the order in which they were appended.
pub struct Checkpoints(pub Vec<Checkpoint>);

impl Checkpoints {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Checkpoint> {
        self.0.iter()
    }
}

impl Index<usize> for Checkpoints {
    type Output = Checkpoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Checkpoints {
    type Item = &'a Checkpoint;
    type IntoIter = std::slice::Iter<'a, Checkpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Checkpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            writeln!(f, "No checkpoints recorded.")
        } else {
            for checkpoint in &self.0 {
                write!(f, "{checkpoint}")?;
            }
            Ok(())
        }
    }
}

/// The whole plan annotated with each task's status.
///
/// Returned by [`crate::Planner::show_plan`]. Tasks without a progress
/// record are shown as pending.
pub struct PlanOverview {
    pub plan: Plan,
    pub state: ProgressState,
}

impl PlanOverview {
    pub fn new(plan: Plan, state: ProgressState) -> Self {
        Self { plan, state }
    }

    pub fn checkpoints(&self) -> Checkpoints {
        Checkpoints(self.state.checkpoints.clone())
    }
}

impl fmt::Display for PlanOverview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.plan.fmt_header(f)?;

        for phase in &self.plan.phases {
            phase.fmt_heading(f)?;
            if phase.number == self.state.current_phase {
                writeln!(f, "*Current phase*")?;
                writeln!(f)?;
            }

            for task in &phase.tasks {
                let status = self.state.status(&task.id).unwrap_or(TaskStatus::Pending);
                write!(f, "- {} ", status.with_icon())?;
                task.fmt_line(f)?;
                writeln!(f)?;

                if let Some(notes) = self
                    .state
                    .tasks
                    .get(&task.id)
                    .and_then(|record| record.notes.as_deref())
                {
                    writeln!(f, "  - Notes: {notes}")?;
                }
            }
            writeln!(f)?;
        }

        if !self.state.checkpoints.is_empty() {
            writeln!(f, "## Checkpoints")?;
            writeln!(f)?;
            write!(f, "{}", self.checkpoints())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::compile,
        models::{RawPhase, RawPlan, RawTask, TaskId},
    };

    #[test]
    fn test_overview_shows_statuses_and_checkpoints() {
        let plan = compile(&RawPlan {
            project_name: "Overview".to_string(),
            phases: vec![RawPhase {
                number: 1,
                name: "Only".to_string(),
                tasks: vec![
                    RawTask {
                        id: "phase1-task1".to_string(),
                        title: "First".to_string(),
                        ..Default::default()
                    },
                    RawTask {
                        id: "phase1-task2".to_string(),
                        title: "Second".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap();

        let mut state = ProgressState::initialize(&plan);
        let first: TaskId = "phase1-task1".parse().unwrap();
        state
            .transition(&first, TaskStatus::Completed, Some("merged".to_string()))
            .unwrap();
        state.append_checkpoint(1, "phase1-task1", "Landed the first task").unwrap();

        let output = PlanOverview::new(plan, state).to_string();
        assert!(output.contains("*Current phase*"));
        assert!(output.contains("- ✓ Completed **phase1-task1**: First"));
        assert!(output.contains("  - Notes: merged"));
        assert!(output.contains("- ○ Pending **phase1-task2**: Second"));
        assert!(output.contains("## Checkpoints"));
        assert!(output.contains("`phase1-task1`: Landed the first task"));
    }

    #[test]
    fn test_empty_checkpoints() {
        let checkpoints = Checkpoints(Vec::new());
        assert!(checkpoints.is_empty());
        assert_eq!(checkpoints.to_string(), "No checkpoints recorded.\n");
    }
}
