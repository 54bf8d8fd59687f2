//! Adapters from generator text to the compiler's [`RawPlan`] input.
//!
//! Generated documents arrive either as a JSON object (often wrapped in a
//! fenced code block and surrounded by prose) or as a markdown task list.
//! Both paths are fallible and neither performs validation: ids, phase
//! numbers and dependencies are passed through verbatim so the compiler can
//! reject them with a precise error.
//!
//! The markdown form understood here:
//!
//! ```text
//! # Project name
//!
//! ## Phase 1: Foundation
//! - [ ] phase1-task1: Set up the workspace
//!   Create the crate layout.
//!   Depends on: none
//!   Parallelizable: yes
//! - [ ] phase1-task2: Add the parser
//!   Depends on: phase1-task1
//! ```

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::{
    error::{PlannerError, Result},
    models::{RawPhase, RawPlan, RawTask},
};

fn fenced_json() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)?\s*\n(\{.*?\})\s*```").expect("fenced json pattern")
    })
}

fn title_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#\s+(.+?)\s*$").expect("title pattern"))
}

fn phase_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^#{2,3}\s+phase\s+(\d+)\s*(?:[:\-–]\s*(.*?))?\s*$")
            .expect("phase heading pattern")
    })
}

fn task_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*[-*]\s+(?:\[[ xX]\]\s+)?(?:\*\*)?([A-Za-z0-9_\-]+)(?:\*\*)?\s*:\s*(.*?)\s*$")
            .expect("task line pattern")
    })
}

fn criteria_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^\s*[-*]\s+(?:\*\*)?(entry|exit)(?:\s+criteri(?:a|on))?(?:\*\*)?\s*:\s*(.*?)\s*$",
        )
        .expect("criteria pattern")
    })
}

fn dependency_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s+(?:[-*]\s+)?(?:depends\s+on|dependencies)\s*:\s*(.*?)\s*$")
            .expect("dependency pattern")
    })
}

fn parallel_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s+(?:[-*]\s+)?parallelizable\s*:\s*(yes|no|true|false)\s*$")
            .expect("parallelizable pattern")
    })
}

/// Reads a generated plan document.
///
/// A JSON object, bare or inside a fenced block, is deserialized directly.
/// Anything else goes through the markdown adapter.
///
/// # Errors
///
/// Returns [`PlannerError::Adapter`] when the text holds neither a readable
/// JSON plan nor any markdown phases with tasks.
pub fn parse_plan_text(text: &str) -> Result<RawPlan> {
    if let Some(json) = extract_json(text) {
        debug!("Reading plan as JSON ({} bytes)", json.len());
        return serde_json::from_str(json)
            .map_err(|e| PlannerError::adapter(format!("invalid JSON plan: {e}")));
    }

    debug!("Reading plan as markdown");
    parse_markdown_plan(text)
}

/// Finds the JSON object in a generator reply, if there is one.
fn extract_json(text: &str) -> Option<&str> {
    if let Some(captures) = fenced_json().captures(text) {
        return captures.get(1).map(|m| m.as_str());
    }

    let trimmed = text.trim();
    (trimmed.starts_with('{') && trimmed.ends_with('}')).then_some(trimmed)
}

/// Splits a dependency list such as `phase1-task1, phase1-task2` or `none`.
fn split_dependencies(list: &str) -> Vec<String> {
    let list = list.trim().trim_end_matches('.');
    if list.is_empty() || matches!(list.to_lowercase().as_str(), "none" | "-" | "n/a") {
        return Vec::new();
    }

    list.split([',', ';'])
        .map(|dep| dep.trim().trim_matches('`').to_string())
        .filter(|dep| !dep.is_empty())
        .collect()
}

/// Parses the markdown task-list form documented on this module.
///
/// # Errors
///
/// Returns [`PlannerError::Adapter`] for tasks outside any phase, malformed
/// phase numbers, or a document without phases or tasks.
pub fn parse_markdown_plan(text: &str) -> Result<RawPlan> {
    let mut plan = RawPlan::default();
    let mut summary_lines: Vec<&str> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(captures) = phase_heading().captures(line) {
            let number = captures[1].parse::<u32>().map_err(|_| {
                PlannerError::adapter(format!("line {}: phase number out of range", line_no + 1))
            })?;
            plan.phases.push(RawPhase {
                number,
                name: captures
                    .get(2)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                ..Default::default()
            });
            continue;
        }

        if plan.project_name.is_empty() {
            if let Some(captures) = title_line().captures(line) {
                plan.project_name = captures[1].to_string();
                continue;
            }
        }

        let current_task = plan
            .phases
            .last_mut()
            .and_then(|phase| phase.tasks.last_mut());
        if let Some(task) = current_task {
            if let Some(captures) = dependency_line().captures(line) {
                task.dependencies = split_dependencies(&captures[1]);
                continue;
            }
            if let Some(captures) = parallel_line().captures(line) {
                let flag = captures[1].to_lowercase();
                task.parallelizable = flag == "yes" || flag == "true";
                continue;
            }
        }

        if let Some(captures) = criteria_line().captures(line) {
            match plan.phases.last_mut() {
                Some(phase) => {
                    let criterion = captures[2].to_string();
                    if captures[1].eq_ignore_ascii_case("entry") {
                        phase.entry_criteria.push(criterion);
                    } else {
                        phase.exit_criteria.push(criterion);
                    }
                }
                None => summary_lines.push(line.trim()),
            }
            continue;
        }

        if let Some(captures) = task_line().captures(line) {
            let Some(phase) = plan.phases.last_mut() else {
                return Err(PlannerError::adapter(format!(
                    "line {}: task '{}' appears before any phase heading",
                    line_no + 1,
                    &captures[1]
                )));
            };
            phase.tasks.push(RawTask {
                id: captures[1].to_string(),
                title: captures[2].to_string(),
                ..Default::default()
            });
            continue;
        }

        // Indented lines describe the current task, anything else the
        // current phase or, before any phase, the plan.
        let Some(phase) = plan.phases.last_mut() else {
            summary_lines.push(line.trim());
            continue;
        };
        let indented = line.starts_with([' ', '\t']);
        match phase.tasks.last_mut() {
            Some(task) if indented => {
                if !task.description.is_empty() {
                    task.description.push('\n');
                }
                task.description.push_str(line.trim());
            }
            _ => {
                if !phase.description.is_empty() {
                    phase.description.push('\n');
                }
                phase.description.push_str(line.trim());
            }
        }
    }

    if plan.phases.is_empty() {
        return Err(PlannerError::adapter("no phase headings found"));
    }
    if plan.phases.iter().all(|phase| phase.tasks.is_empty()) {
        return Err(PlannerError::adapter("no tasks found"));
    }
    plan.summary = summary_lines.join("\n");

    Ok(plan)
}
