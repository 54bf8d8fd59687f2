//! Loosely structured plan as produced by the document generator.
//!
//! Nothing here is validated; [`crate::compiler::compile`] turns a
//! [`RawPlan`] into a [`crate::models::Plan`] or rejects it.

use serde::{Deserialize, Serialize};

/// Compiler input: phases and tasks with free-text dependency references.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawPlan {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub phases: Vec<RawPhase>,
}

/// A phase before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawPhase {
    pub number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub entry_criteria: Vec<String>,
    #[serde(default)]
    pub exit_criteria: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<RawTask>,
}

/// A task before validation. `id` and `dependencies` are unchecked strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTask {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub parallelizable: bool,
}
