//! Command-line arguments.
//!
//! Argument structs carry clap attributes only; each converts into the
//! matching `waypoint_core::params` type so the CLI and the MCP server feed
//! the planner identical values.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use waypoint_core::{params::*, store::StoreKind};

/// Phased task planning and progress tracking for coding agents
///
/// Waypoint compiles a generated project plan into validated,
/// dependency-ordered tasks and tracks their completion across work sessions.
/// Use it from the command line or run it as an MCP server so an agent can
/// ask for its next task.
#[derive(Parser)]
#[command(version, about, name = "wp")]
pub struct Args {
    /// Directory holding the plan and progress. Defaults to ./.waypoint
    #[arg(long, global = true, env = "WAYPOINT_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Storage backend for the plan and progress
    #[arg(long, global = true, value_enum, default_value_t = Backend::Json)]
    pub backend: Backend,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Storage backends selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// plan.json and progress.json
    Json,
    /// A single waypoint.db SQLite database
    Sqlite,
}

impl From<Backend> for StoreKind {
    fn from(val: Backend) -> Self {
        match val {
            Backend::Json => StoreKind::Json,
            Backend::Sqlite => StoreKind::Sqlite,
        }
    }
}

/// Available commands for the Waypoint CLI
///
/// Running `wp` without a command shows the progress summary.
#[derive(Subcommand)]
pub enum Commands {
    /// Compile a plan document (JSON or markdown) and store it
    #[command(alias = "c")]
    Compile(CompileArgs),
    /// Show the next task to work on
    #[command(alias = "n")]
    Next(NextArgs),
    /// Mark a task as in progress
    Start(TransitionArgs),
    /// Mark a task as completed
    #[command(alias = "done")]
    Complete(TransitionArgs),
    /// Record a checkpoint summarizing work on a task
    #[command(alias = "cp")]
    Checkpoint(CheckpointArgs),
    /// Move to the next phase once the current one is complete
    Advance,
    /// Show task counts per phase
    #[command(alias = "st")]
    Status,
    /// Show the whole plan with task statuses
    #[command(alias = "s")]
    Show,
    /// Print task ids in dependency order
    Order,
    /// Start the MCP server on stdio
    Serve,
}

/// Compile a plan document
///
/// The file may contain a JSON plan (optionally inside a fenced code block)
/// or a markdown task list. Compiling again later regenerates the plan:
/// progress for task ids that remain is kept.
#[derive(ClapArgs)]
pub struct CompileArgs {
    /// Path to the plan document
    pub file: PathBuf,
}

#[derive(ClapArgs)]
pub struct NextArgs {
    /// Print the verdict as JSON instead of markdown
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs)]
pub struct TransitionArgs {
    /// Task id, e.g. phase1-task2
    pub task_id: String,
    /// Note to store on the task, replacing any earlier note
    #[arg(short, long)]
    pub note: Option<String>,
}

impl From<TransitionArgs> for TransitionTask {
    fn from(val: TransitionArgs) -> Self {
        TransitionTask {
            task_id: val.task_id,
            note: val.note,
        }
    }
}

#[derive(ClapArgs)]
pub struct CheckpointArgs {
    /// Task the checkpoint refers to
    pub task_id: String,
    /// What was accomplished
    pub summary: String,
    /// Phase to file the checkpoint under. Defaults to the task's phase
    #[arg(short, long)]
    pub phase: Option<u32>,
}

impl From<CheckpointArgs> for AddCheckpoint {
    fn from(val: CheckpointArgs) -> Self {
        AddCheckpoint {
            task_id: val.task_id,
            summary: val.summary,
            phase: val.phase,
        }
    }
}
