//! MCP server implementation for Waypoint
//!
//! Exposes the planner to coding agents over the Model Context Protocol. The
//! planner sits behind a mutex, so tool calls from one session are applied
//! one at a time.

use std::sync::Arc;

use anyhow::Result;
use log::{debug, error, info};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{Implementation, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use tokio::{
    signal::unix::{signal, SignalKind},
    sync::Mutex,
};
use waypoint_core::Planner;

pub mod errors;
pub mod handlers;

pub use handlers::{AddCheckpoint, McpResult, TransitionTask};

const INSTRUCTIONS: &str = r#"Waypoint tracks a phased implementation plan and tells you what to work on next.

## Core Concepts
- **Phases**: numbered milestones worked strictly in order; `current phase` is advanced explicitly
- **Tasks**: ids of the form `phaseN-taskM`, each with dependencies on other tasks
- **Status**: pending → in_progress → completed (pending → completed is also allowed; nothing moves backwards)
- **Checkpoints**: an append-only log of what was accomplished

## Workflow
1. Call `next_task` to get the first task of the current phase whose dependencies are all completed
2. Call `start_task` with its id, do the work, then `complete_task` (optionally with a note)
3. Record notable progress with `add_checkpoint`
4. When `next_task` reports the phase complete, call `advance_phase`
5. Use `progress_status` for counts and `show_plan` for the full plan with statuses

If `next_task` reports that no task is ready, finish the in-progress tasks it lists first."#;

/// MCP server for Waypoint
#[derive(Clone)]
pub struct WaypointMcpServer {
    planner: Arc<Mutex<Planner>>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl WaypointMcpServer {
    pub fn new(planner: Planner) -> Self {
        Self {
            planner: Arc::new(Mutex::new(planner)),
            tool_router: Self::tool_router(),
        }
    }

    fn handlers(&self) -> handlers::McpHandlers {
        handlers::McpHandlers::new(self.planner.clone())
    }

    #[tool(
        name = "next_task",
        description = "Get the next task to work on in the current phase: the first pending task, in plan order, whose dependencies are all completed. Reports instead when the phase is complete (call advance_phase) or when nothing is ready and which tasks are in progress or waiting on which dependencies."
    )]
    async fn next_task(&self) -> McpResult {
        self.handlers().next_task().await
    }

    #[tool(
        name = "start_task",
        description = "Mark a pending task as in progress. Requires task_id (e.g. 'phase1-task2'); an optional note replaces the task's note. Starting a task with unfinished dependencies is allowed but the result includes a warning."
    )]
    async fn start_task(&self, params: Parameters<TransitionTask>) -> McpResult {
        self.handlers().start_task(params).await
    }

    #[tool(
        name = "complete_task",
        description = "Mark a task as completed, from pending or in progress. Requires task_id; add a note describing what was done. Completed tasks cannot be reopened."
    )]
    async fn complete_task(&self, params: Parameters<TransitionTask>) -> McpResult {
        self.handlers().complete_task(params).await
    }

    #[tool(
        name = "add_checkpoint",
        description = "Append a checkpoint to the progress log. Requires task_id and a non-empty summary of what was accomplished; phase defaults to the task's phase. Checkpoints are never edited or removed."
    )]
    async fn add_checkpoint(&self, params: Parameters<AddCheckpoint>) -> McpResult {
        self.handlers().add_checkpoint(params).await
    }

    #[tool(
        name = "advance_phase",
        description = "Move to the next phase. Only succeeds when every task of the current phase is completed and a later phase exists."
    )]
    async fn advance_phase(&self) -> McpResult {
        self.handlers().advance_phase().await
    }

    #[tool(
        name = "progress_status",
        description = "Show completed, in-progress and pending task counts for each phase and overall, plus the current phase."
    )]
    async fn progress_status(&self) -> McpResult {
        self.handlers().progress_status().await
    }

    #[tool(
        name = "show_plan",
        description = "Show the whole plan: goals, phases, every task with its status, dependencies and notes, and the checkpoint log."
    )]
    async fn show_plan(&self) -> McpResult {
        self.handlers().show_plan().await
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for WaypointMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "waypoint".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}

/// Run the MCP server with stdio transport
pub async fn run_stdio_server(server: WaypointMcpServer) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    info!("Starting Waypoint MCP server on stdio");
    debug!(
        "Server created with {} tools",
        server.tool_router.list_all().len()
    );

    let service = server.serve(stdio()).await.inspect_err(|e| {
        error!("serving error: {e:?}");
    })?;

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = service.waiting() => {
            match result {
                Ok(_) => info!("MCP server stopped normally"),
                Err(e) => error!("MCP server error: {e:?}"),
            }
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }

    info!("MCP server shutdown complete");
    Ok(())
}
