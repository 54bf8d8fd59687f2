//! Markdown formatting for plans, verdicts and operation results.
//!
//! Domain types implement [`std::fmt::Display`] directly (see [`models`]);
//! views that combine several values and the outcomes of mutating operations
//! are wrapper types. Everything renders to markdown so the same text works
//! in the terminal renderer and as MCP tool output.
//!
//! - [`models`]: Display for [`crate::models`] and resolver types
//! - [`overview`]: the plan annotated with progress ([`PlanOverview`])
//! - [`results`]: confirmations for compile, transition, checkpoint, advance
//! - [`datetime`]: local time formatting
//!
//! ```rust
//! use waypoint_core::display::Checkpoints;
//!
//! let trail = Checkpoints(Vec::new());
//! assert_eq!(trail.to_string(), "No checkpoints recorded.\n");
//! ```

pub mod datetime;
pub mod models;
pub mod overview;
pub mod results;

pub use datetime::LocalDateTime;
pub use overview::{Checkpoints, PlanOverview};
pub use results::{
    AdvanceResult, CheckpointResult, CompileResult, NoPlan, Reconciliation, TransitionResult,
};
