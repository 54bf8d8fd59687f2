//! Parameter structures for Waypoint operations.
//!
//! These are shared by the CLI and the MCP server. They carry task ids as
//! plain strings so that every interface gets the same validation, performed
//! by the `parse_*` helpers before the planner touches any state.
//!
//! When the `schema` feature is enabled the structures also derive
//! [`schemars::JsonSchema`], which the MCP server uses to describe its tools.

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{PlannerError, Result},
    models::TaskId,
};

fn parse_task_id(value: &str) -> Result<TaskId> {
    value
        .trim()
        .parse()
        .map_err(|reason: String| PlannerError::invalid_input("task_id").with_reason(reason))
}

/// Parameters for moving a task through its lifecycle.
///
/// Used by both `start_task` and `complete_task`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct TransitionTask {
    /// Task id of the form phaseN-taskM
    pub task_id: String,
    /// Optional note; replaces any earlier note on the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransitionTask {
    /// Validates and returns the task id.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidInput`] for a malformed id.
    pub fn parse_task_id(&self) -> Result<TaskId> {
        parse_task_id(&self.task_id)
    }
}

/// Parameters for recording a checkpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct AddCheckpoint {
    /// Task the checkpoint refers to
    pub task_id: String,
    /// What was accomplished
    pub summary: String,
    /// Phase the checkpoint belongs to; defaults to the task's phase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<u32>,
}

impl AddCheckpoint {
    /// Validates and returns the task id.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidInput`] for a malformed id.
    pub fn parse_task_id(&self) -> Result<TaskId> {
        parse_task_id(&self.task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_id_validation() {
        let params = TransitionTask {
            task_id: " phase2-task3 ".to_string(),
            note: None,
        };
        assert_eq!(params.parse_task_id().unwrap().as_str(), "phase2-task3");

        let params = AddCheckpoint {
            task_id: "task-3".to_string(),
            summary: "done".to_string(),
            phase: None,
        };
        assert!(matches!(
            params.parse_task_id(),
            Err(PlannerError::InvalidInput { ref field, .. }) if field == "task_id"
        ));
    }

    #[test]
    fn test_optional_fields_default() {
        let params: AddCheckpoint =
            serde_json::from_str(r#"{"task_id": "phase1-task1", "summary": "Wired up"}"#).unwrap();
        assert_eq!(params.phase, None);

        let params: TransitionTask = serde_json::from_str(r#"{"task_id": "phase1-task1"}"#).unwrap();
        assert!(params.note.is_none());
    }
}
