//! Waypoint CLI Application
//!
//! Command-line interface and MCP server for the waypoint planner.

mod args;
mod cli;
mod mcp;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands};
use clap::Parser;
use cli::Cli;
use log::info;
use mcp::{run_stdio_server, WaypointMcpServer};
use renderer::TerminalRenderer;
use waypoint_core::PlannerBuilder;
use Commands::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let Args {
        state_dir,
        backend,
        no_color,
        command,
    } = Args::parse();

    let planner = PlannerBuilder::new()
        .with_state_dir(state_dir)
        .with_backend(backend.into())
        .build()
        .await
        .context("Failed to initialize planner")?;

    info!("Waypoint started with state in {}", planner.location().display());

    let cli = Cli::new(planner, TerminalRenderer::new(!no_color));
    match command {
        Some(Compile(args)) => cli.compile(args).await,
        Some(Next(args)) => cli.next(args).await,
        Some(Start(args)) => cli.start(args).await,
        Some(Complete(args)) => cli.complete(args).await,
        Some(Checkpoint(args)) => cli.checkpoint(args).await,
        Some(Advance) => cli.advance().await,
        Some(Show) => cli.show().await,
        Some(Order) => cli.order().await,
        Some(Serve) => {
            info!("Starting Waypoint MCP server");
            run_stdio_server(WaypointMcpServer::new(cli.into_planner()))
                .await
                .context("MCP server failed")
        }
        Some(Status) | None => cli.status().await,
    }
}
