//! Error types for the waypoint library.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::TaskStatus;

/// Validation failures raised while compiling a raw plan.
///
/// Each variant names the offending task ids or phase numbers so the caller
/// can locate the problem in the generated document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The plan has no phases at all
    #[error("Plan contains no phases")]
    EmptyPlan,
    /// A phase has an empty task list
    #[error("Phase {phase} contains no tasks")]
    EmptyPhase { phase: u32 },
    /// A task id does not match `phase{N}-task{M}`
    #[error("Task id '{id}' in phase {phase} is not of the form phase{{N}}-task{{M}}")]
    MalformedTaskId { id: String, phase: u32 },
    /// The same task id appears twice in the plan
    #[error("Task id '{id}' is declared in phase {first_phase} and again in phase {second_phase}")]
    DuplicateTaskId {
        id: String,
        first_phase: u32,
        second_phase: u32,
    },
    /// Phase numbers have a gap, a duplicate, or do not start at 1
    #[error("Phase numbers must run 1..={expected_last} without gaps, found {found:?}")]
    NonContiguousPhases { expected_last: u32, found: Vec<u32> },
    /// A task id names a phase other than the one containing it
    #[error("Task '{id}' is declared in phase {phase} but its id names phase {id_phase}")]
    TaskPhaseMismatch { id: String, phase: u32, id_phase: u32 },
    /// A dependency references a task that does not exist
    #[error("Task '{task}' depends on unknown task '{dependency}'")]
    DanglingDependency { task: String, dependency: String },
    /// A task lists itself as a dependency
    #[error("Task '{task}' depends on itself")]
    SelfDependency { task: String },
    /// The dependency graph contains a cycle
    #[error("Dependency cycle between tasks: {}", members.join(" -> "))]
    DependencyCycle { members: Vec<String> },
}

/// Comprehensive error type for all planner operations.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// The raw plan failed validation
    #[error("Plan compilation failed: {0}")]
    Compile(#[from] CompileError),
    /// A transition or lookup referenced a task absent from the progress state
    #[error("Task '{id}' is not part of the current progress state")]
    UnknownTask { id: String },
    /// A status move outside the forward-only lifecycle
    #[error("Illegal transition for task '{task}': {from} -> {to}")]
    IllegalTransition {
        task: String,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// No plan has been initialized at this location yet
    #[error("No plan has been initialized at '{}'", location.display())]
    StateNotFound { location: PathBuf },
    /// The stored progress tracks different tasks than the stored plan
    #[error("Progress at '{}' does not match the stored plan; compile the plan again to reconcile it", location.display())]
    StateMismatch { location: PathBuf },
    /// The progress state points at a phase the plan does not have
    #[error("Phase {phase} does not exist in the current plan")]
    PhaseNotFound { phase: u32 },
    /// Advancing was requested before every task of the phase completed
    #[error("Phase {phase} still has {remaining} unfinished task(s)")]
    PhaseIncomplete { phase: u32, remaining: usize },
    /// Advancing was requested on the final phase
    #[error("Phase {phase} is the last phase of the plan")]
    NoNextPhase { phase: u32 },
    /// File system errors while persisting or loading state
    #[error("Storage error at path '{}': {message}", path.display())]
    Storage {
        message: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Free-text plan could not be turned into a structured plan
    #[error("Could not read plan text: {reason}")]
    Adapter { reason: String },
    /// The external document generator failed
    #[error("Plan generation failed: {message}")]
    Generation { message: String },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PlannerError {
        PlannerError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl PlannerError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates an adapter error with the given reason.
    pub fn adapter(reason: impl Into<String>) -> Self {
        Self::Adapter {
            reason: reason.into(),
        }
    }

    /// Returns true when the error only signals that nothing was initialized.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StateNotFound { .. })
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|source| PlannerError::Database {
            message: message.to_string(),
            source,
        })
    }
}

/// Specialized extension trait for file system Results.
pub trait StorageResultExt<T> {
    /// Map I/O errors with a message and the path involved.
    fn storage_context(self, message: &str, path: &std::path::Path) -> Result<T>;
}

impl<T> StorageResultExt<T> for std::result::Result<T, std::io::Error> {
    fn storage_context(self, message: &str, path: &std::path::Path) -> Result<T> {
        self.map_err(|source| PlannerError::Storage {
            message: message.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Result type alias for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;
