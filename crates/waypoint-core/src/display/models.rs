//! Display implementations for domain models.
//!
//! All output is markdown so the CLI can render it through the terminal
//! renderer and the MCP server can return it as text unchanged.

use std::fmt;

use super::datetime::LocalDateTime;
use crate::{
    models::{Checkpoint, Phase, Plan, Task, TaskId, TaskStatus},
    resolver::{NextTask, ProgressSummary, StatusCounts},
};

/// Writes `ids` as a comma separated list of inline code spans.
pub(crate) fn write_ids(f: &mut fmt::Formatter<'_>, ids: &[TaskId]) -> fmt::Result {
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "`{id}`")?;
    }
    Ok(())
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Task {
    /// One list item: id, title and dependency annotations.
    pub(crate) fn fmt_line(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}**: {}", self.id, self.title)?;
        if !self.dependencies.is_empty() {
            write!(f, " (depends on ")?;
            write_ids(f, &self.dependencies)?;
            write!(f, ")")?;
        }
        if self.parallelizable {
            write!(f, " [parallel]")?;
        }
        Ok(())
    }
}

impl Phase {
    pub(crate) fn fmt_heading(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            writeln!(f, "## Phase {}", self.number)?;
        } else {
            writeln!(f, "## Phase {}: {}", self.number, self.name)?;
        }
        writeln!(f)?;

        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
            writeln!(f)?;
        }
        for criterion in &self.entry_criteria {
            writeln!(f, "- Entry: {criterion}")?;
        }
        for criterion in &self.exit_criteria {
            writeln!(f, "- Exit: {criterion}")?;
        }
        if !self.entry_criteria.is_empty() || !self.exit_criteria.is_empty() {
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Plan {
    pub(crate) fn fmt_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.project_name)?;
        writeln!(f)?;

        if !self.summary.is_empty() {
            writeln!(f, "{}", self.summary)?;
            writeln!(f)?;
        }

        if !self.goals.is_empty() {
            writeln!(f, "### Goals")?;
            writeln!(f)?;
            for goal in &self.goals {
                writeln!(f, "- {goal}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_header(f)?;
        writeln!(
            f,
            "{} phases, {} tasks",
            self.phases.len(),
            self.total_tasks
        )?;
        writeln!(f)?;

        for phase in &self.phases {
            phase.fmt_heading(f)?;
            for task in &phase.tasks {
                write!(f, "- ")?;
                task.fmt_line(f)?;
                writeln!(f)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for NextTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextTask::Next {
                task_id,
                title,
                description,
                dependencies,
            } => {
                writeln!(f, "## Next task: {task_id}")?;
                writeln!(f)?;
                writeln!(f, "**{title}**")?;
                writeln!(f)?;
                if !description.is_empty() {
                    writeln!(f, "{description}")?;
                    writeln!(f)?;
                }
                if !dependencies.is_empty() {
                    write!(f, "- Depends on: ")?;
                    write_ids(f, dependencies)?;
                    writeln!(f)?;
                }
                Ok(())
            }
            NextTask::PhaseComplete { phase, last_phase } => {
                if *last_phase {
                    writeln!(f, "Phase {phase} is complete. Every phase of the plan is done.")
                } else {
                    writeln!(
                        f,
                        "Phase {phase} is complete. Advance to phase {} to continue.",
                        phase + 1
                    )
                }
            }
            NextTask::Blocked {
                in_progress,
                blocked,
            } => {
                writeln!(f, "## No task is ready")?;
                writeln!(f)?;
                if !in_progress.is_empty() {
                    write!(f, "- In progress: ")?;
                    write_ids(f, in_progress)?;
                    writeln!(f)?;
                }
                for task in blocked {
                    write!(f, "- `{}` waits on ", task.task_id)?;
                    write_ids(f, &task.unmet_dependencies)?;
                    writeln!(f)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} completed ({}%)",
            self.completed,
            self.total,
            self.percent_complete()
        )
    }
}

impl fmt::Display for ProgressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# Progress: {}", self.project_name)?;
        writeln!(f)?;
        writeln!(f, "- **Current phase**: {}", self.current_phase)?;
        writeln!(f, "- **Overall**: {}", self.overall)?;
        if self.overall.in_progress > 0 {
            writeln!(f, "- **In progress**: {}", self.overall.in_progress)?;
        }
        writeln!(f)?;

        writeln!(f, "| Phase | Name | Completed | In progress | Pending |")?;
        writeln!(f, "|-|-|-|-|-|")?;
        for phase in &self.phases {
            let marker = if phase.number == self.current_phase {
                " ➤"
            } else {
                ""
            };
            writeln!(
                f,
                "| {}{marker} | {} | {}/{} | {} | {} |",
                phase.number,
                phase.name,
                phase.counts.completed,
                phase.counts.total,
                phase.counts.in_progress,
                phase.counts.pending
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "- {} · phase {} · `{}`: {}",
            LocalDateTime(&self.created_at),
            self.phase,
            self.task,
            self.summary
        )
    }
}
