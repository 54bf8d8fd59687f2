//! Command handlers for the Waypoint CLI.
//!
//! Each handler calls one [`Planner`] operation and renders the result's
//! markdown `Display` output through the [`TerminalRenderer`], the same text
//! the MCP server returns. Queries in a project without a plan print a hint
//! and succeed; changes to progress fail.

use std::{fmt::Display, path::Path};

use anyhow::{Context, Result};
use log::debug;
use waypoint_core::{adapter::parse_plan_text, params::*, NoPlan, Planner};

use crate::{
    args::{CheckpointArgs, CompileArgs, NextArgs, TransitionArgs},
    renderer::TerminalRenderer,
};

/// Runs CLI commands against a planner.
pub struct Cli {
    planner: Planner,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(planner: Planner, renderer: TerminalRenderer) -> Self {
        Self { planner, renderer }
    }

    /// Hands the planner over, e.g. to the MCP server.
    pub fn into_planner(self) -> Planner {
        self.planner
    }

    fn render(&self, value: &impl Display) -> Result<()> {
        self.renderer.render(&value.to_string())
    }

    fn no_plan(&self) -> NoPlan {
        NoPlan::new(self.planner.location())
    }

    /// Renders a query result, or the no-plan hint when nothing was compiled.
    fn render_query<T: Display>(
        &self,
        result: waypoint_core::Result<T>,
        context: &'static str,
    ) -> Result<()> {
        match result {
            Ok(value) => self.render(&value),
            Err(e) if e.is_not_found() => self.renderer.render(&format!(
                "{}\nRun `wp compile <FILE>` to create one.\n",
                self.no_plan()
            )),
            Err(e) => Err(anyhow::Error::new(e).context(context)),
        }
    }

    /// Reads, compiles and stores a plan document.
    pub async fn compile(&self, args: CompileArgs) -> Result<()> {
        let text = read_document(&args.file)?;
        let raw = parse_plan_text(&text)
            .with_context(|| format!("Failed to read plan from {}", args.file.display()))?;

        let result = self
            .planner
            .compile_plan(raw)
            .await
            .context("Failed to compile plan")?;
        self.render(&result)
    }

    pub async fn next(&self, args: NextArgs) -> Result<()> {
        let next = self.planner.next_task().await;
        if !args.json {
            return self.render_query(next, "Failed to resolve next task");
        }

        let value = match next {
            Ok(next) => serde_json::to_value(&next)?,
            Err(e) if e.is_not_found() => serde_json::json!({
                "kind": "noPlan",
                "location": self.planner.location(),
            }),
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to resolve next task")),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }

    pub async fn start(&self, args: TransitionArgs) -> Result<()> {
        let params: TransitionTask = args.into();
        let result = self
            .planner
            .start_task(&params)
            .await
            .with_context(|| format!("Failed to start task {}", params.task_id))?;
        self.render(&result)
    }

    pub async fn complete(&self, args: TransitionArgs) -> Result<()> {
        let params: TransitionTask = args.into();
        let result = self
            .planner
            .complete_task(&params)
            .await
            .with_context(|| format!("Failed to complete task {}", params.task_id))?;
        self.render(&result)
    }

    pub async fn checkpoint(&self, args: CheckpointArgs) -> Result<()> {
        let params: AddCheckpoint = args.into();
        let result = self
            .planner
            .add_checkpoint(&params)
            .await
            .context("Failed to record checkpoint")?;
        self.render(&result)
    }

    pub async fn advance(&self) -> Result<()> {
        let result = self
            .planner
            .advance_phase()
            .await
            .context("Failed to advance phase")?;
        self.render(&result)
    }

    pub async fn status(&self) -> Result<()> {
        let summary = self.planner.progress_summary().await;
        self.render_query(summary, "Failed to load progress")
    }

    pub async fn show(&self) -> Result<()> {
        let overview = self.planner.show_plan().await;
        self.render_query(overview, "Failed to load plan")
    }

    pub async fn order(&self) -> Result<()> {
        let order = self.planner.execution_order().await.map(|order| {
            order
                .iter()
                .enumerate()
                .map(|(position, id)| {
                    format!(
                        "{}. {id} (phase {}, task {})\n",
                        position + 1,
                        id.phase(),
                        id.index()
                    )
                })
                .collect::<String>()
        });
        self.render_query(order, "Failed to order tasks")
    }
}

fn read_document(path: &Path) -> Result<String> {
    debug!("Reading plan document {}", path.display());
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))
}
