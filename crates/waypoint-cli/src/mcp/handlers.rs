//! MCP tool handlers implementation

use std::sync::Arc;

use log::debug;
use rmcp::{
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    ErrorData,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio::sync::Mutex;
use waypoint_core::{params as core, NoPlan, Planner, PlannerError};

use super::errors::to_mcp_error;

/// Transparent MCP wrapper for core parameter types.
///
/// Deserializes straight into the wrapped type and reuses its schema, so the
/// tool schemas always match the structures the planner accepts.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct McpParams<T>(T)
where
    T: JsonSchema;

impl<T> JsonSchema for McpParams<T>
where
    T: JsonSchema,
{
    fn schema_name() -> std::borrow::Cow<'static, str> {
        T::schema_name()
    }

    fn json_schema(g: &mut schemars::SchemaGenerator) -> schemars::Schema {
        T::json_schema(g)
    }
}

impl<T> AsRef<T> for McpParams<T>
where
    T: JsonSchema,
{
    fn as_ref(&self) -> &T {
        &self.0
    }
}

pub type TransitionTask = McpParams<core::TransitionTask>;
pub type AddCheckpoint = McpParams<core::AddCheckpoint>;

pub type McpResult = Result<CallToolResult, ErrorData>;

fn text_result(value: &impl std::fmt::Display) -> McpResult {
    Ok(CallToolResult::success(vec![Content::text(
        value.to_string(),
    )]))
}

/// Query results become text; a project without a plan is reported as a
/// normal result rather than an error.
fn query_result<T: std::fmt::Display>(
    planner: &Planner,
    result: Result<T, PlannerError>,
    message: &str,
) -> McpResult {
    match result {
        Ok(value) => text_result(&value),
        Err(e) if e.is_not_found() => text_result(&NoPlan::new(planner.location())),
        Err(e) => Err(to_mcp_error(message, &e)),
    }
}

/// Handler implementations for the MCP server
pub struct McpHandlers {
    planner: Arc<Mutex<Planner>>,
}

impl McpHandlers {
    pub fn new(planner: Arc<Mutex<Planner>>) -> Self {
        Self { planner }
    }

    pub async fn next_task(&self) -> McpResult {
        let planner = self.planner.lock().await;
        let next = planner.next_task().await;
        query_result(&planner, next, "Failed to resolve next task")
    }

    pub async fn start_task(&self, Parameters(params): Parameters<TransitionTask>) -> McpResult {
        debug!("start_task: {:?}", params);

        let result = self
            .planner
            .lock()
            .await
            .start_task(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to start task", &e))?;
        text_result(&result)
    }

    pub async fn complete_task(&self, Parameters(params): Parameters<TransitionTask>) -> McpResult {
        debug!("complete_task: {:?}", params);

        let result = self
            .planner
            .lock()
            .await
            .complete_task(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to complete task", &e))?;
        text_result(&result)
    }

    pub async fn add_checkpoint(&self, Parameters(params): Parameters<AddCheckpoint>) -> McpResult {
        debug!("add_checkpoint: {:?}", params);

        let result = self
            .planner
            .lock()
            .await
            .add_checkpoint(params.as_ref())
            .await
            .map_err(|e| to_mcp_error("Failed to record checkpoint", &e))?;
        text_result(&result)
    }

    pub async fn advance_phase(&self) -> McpResult {
        let result = self
            .planner
            .lock()
            .await
            .advance_phase()
            .await
            .map_err(|e| to_mcp_error("Failed to advance phase", &e))?;
        text_result(&result)
    }

    pub async fn progress_status(&self) -> McpResult {
        let planner = self.planner.lock().await;
        let summary = planner.progress_summary().await;
        query_result(&planner, summary, "Failed to load progress")
    }

    pub async fn show_plan(&self) -> McpResult {
        let planner = self.planner.lock().await;
        let overview = planner.show_plan().await;
        query_result(&planner, overview, "Failed to load plan")
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use waypoint_core::{models::RawPlan, PlannerBuilder};

    use super::*;

    const PLAN_JSON: &str = r#"{
        "projectName": "MCP Test",
        "phases": [{"number": 1, "name": "One", "tasks": [
            {"id": "phase1-task1", "title": "First"},
            {"id": "phase1-task2", "title": "Second", "dependencies": ["phase1-task1"]}
        ]}]
    }"#;

    async fn create_empty_handlers() -> (TempDir, McpHandlers, Planner) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let planner = PlannerBuilder::new()
            .with_state_dir(Some(temp_dir.path()))
            .build()
            .await
            .expect("Failed to create planner");
        let handlers = McpHandlers::new(Arc::new(Mutex::new(planner.clone())));
        (temp_dir, handlers, planner)
    }

    async fn create_handlers() -> (TempDir, McpHandlers) {
        let (temp_dir, handlers, planner) = create_empty_handlers().await;
        let raw: RawPlan = serde_json::from_str(PLAN_JSON).unwrap();
        planner.compile_plan(raw).await.unwrap();
        (temp_dir, handlers)
    }

    fn text_of(result: &CallToolResult) -> String {
        serde_json::to_value(result).unwrap()["content"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }

    fn transition(task_id: &str) -> Parameters<TransitionTask> {
        Parameters(serde_json::from_value(serde_json::json!({ "task_id": task_id })).unwrap())
    }

    #[tokio::test]
    async fn test_next_and_complete() {
        let (_temp_dir, handlers) = create_handlers().await;

        let next = handlers.next_task().await.unwrap();
        assert!(text_of(&next).contains("Next task: phase1-task1"));

        let done = handlers.complete_task(transition("phase1-task1")).await.unwrap();
        assert!(text_of(&done).contains("phase1-task1"));

        let next = handlers.next_task().await.unwrap();
        assert!(text_of(&next).contains("Next task: phase1-task2"));
    }

    #[tokio::test]
    async fn test_errors_map_to_invalid_params() {
        let (_temp_dir, handlers) = create_handlers().await;

        let err = handlers.start_task(transition("bogus")).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);

        let err = handlers.advance_phase().await.unwrap_err();
        assert!(err.message.contains("unfinished"));
    }

    #[tokio::test]
    async fn test_queries_without_plan_are_not_errors() {
        let (_temp_dir, handlers, _planner) = create_empty_handlers().await;

        let next = handlers.next_task().await.unwrap();
        assert!(text_of(&next).contains("No plan has been initialized"));
        let status = handlers.progress_status().await.unwrap();
        assert!(text_of(&status).contains("No plan has been initialized"));
        let plan = handlers.show_plan().await.unwrap();
        assert!(text_of(&plan).contains("No plan has been initialized"));

        // Changing progress still needs a plan.
        let err = handlers.start_task(transition("phase1-task1")).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("No plan has been initialized"));
    }
}
