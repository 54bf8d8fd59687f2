//! Plan generation pipeline.
//!
//! Document text comes from an injected [`PlanGenerator`]; an optional
//! [`ResearchProvider`] contributes best-practice notes that are folded into
//! the prompt. The generator's reply is handed to the
//! [`adapter`](crate::adapter) and becomes a [`RawPlan`] for the compiler.

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::{
    adapter::parse_plan_text,
    error::{PlannerError, Result},
    models::RawPlan,
};

/// A text-generation service: given a prompt, return document text.
#[async_trait]
pub trait PlanGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// An optional source of best-practice guidance for a topic.
///
/// Failures are never fatal; the pipeline continues without the research.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn best_practices(&self, topic: &str) -> Result<String>;
}

/// What to generate a plan for.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    /// Rough project idea, or the title of the existing document
    pub idea: String,
    /// Existing requirements document to plan from, if any
    pub existing_document: Option<String>,
    /// Features the plan must cover
    pub features: Vec<String>,
}

const OUTPUT_CONTRACT: &str = "\
Respond with a single JSON object and nothing else, using this shape:
{
  \"projectName\": string,
  \"summary\": string,
  \"goals\": [string],
  \"phases\": [{
    \"number\": 1,
    \"name\": string,
    \"description\": string,
    \"entryCriteria\": [string],
    \"exitCriteria\": [string],
    \"tasks\": [{
      \"id\": \"phase1-task1\",
      \"title\": string,
      \"description\": string,
      \"dependencies\": [\"phaseN-taskM\"],
      \"parallelizable\": boolean
    }]
  }]
}
Number phases from 1 without gaps. Task ids are phase{N}-task{M} where N is
the containing phase. Dependencies must name existing tasks and must not form
cycles.";

impl PlanRequest {
    pub fn new(idea: impl Into<String>) -> Self {
        Self {
            idea: idea.into(),
            ..Default::default()
        }
    }

    /// Topic handed to the research provider.
    pub fn research_topic(&self) -> String {
        if self.features.is_empty() {
            self.idea.clone()
        } else {
            format!("{} ({})", self.idea, self.features.join(", "))
        }
    }

    /// Assembles the generator prompt, appending `research` when present.
    pub fn prompt(&self, research: Option<&str>) -> String {
        let mut prompt = String::from(
            "Break the following project into phases of small, dependency-ordered \
             implementation tasks.\n\n",
        );

        match &self.existing_document {
            Some(document) => {
                prompt.push_str(&format!("## Project\n{}\n\n", self.idea));
                prompt.push_str(&format!("## Requirements document\n{document}\n\n"));
            }
            None => prompt.push_str(&format!("## Project idea\n{}\n\n", self.idea)),
        }

        if !self.features.is_empty() {
            prompt.push_str("## Required features\n");
            for feature in &self.features {
                prompt.push_str(&format!("- {feature}\n"));
            }
            prompt.push('\n');
        }

        if let Some(research) = research.map(str::trim).filter(|r| !r.is_empty()) {
            prompt.push_str(&format!("## Best practices\n{research}\n\n"));
        }

        prompt.push_str(OUTPUT_CONTRACT);
        prompt
    }
}

/// Runs the generator and adapts its reply into a [`RawPlan`].
///
/// The research provider is consulted first when one is supplied; if it
/// fails the failure is logged and generation proceeds without it.
///
/// # Errors
///
/// Returns [`PlannerError::InvalidInput`] for an empty idea, the generator's
/// own error, or [`PlannerError::Adapter`] when the reply is unreadable.
pub async fn generate_raw_plan(
    generator: &dyn PlanGenerator,
    research: Option<&dyn ResearchProvider>,
    request: &PlanRequest,
) -> Result<RawPlan> {
    if request.idea.trim().is_empty() {
        return Err(PlannerError::invalid_input("idea").with_reason("must not be empty"));
    }

    let notes = match research {
        Some(provider) => match provider.best_practices(&request.research_topic()).await {
            Ok(notes) => Some(notes),
            Err(e) => {
                warn!("Research unavailable, continuing without it: {e}");
                None
            }
        },
        None => None,
    };

    let prompt = request.prompt(notes.as_deref());
    debug!("Requesting plan ({} prompt bytes)", prompt.len());
    let text = generator.generate(&prompt).await?;
    info!("Generator returned {} bytes of plan text", text.len());

    parse_plan_text(&text)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct CannedGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
        }
    }

    #[async_trait]
    impl PlanGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl PlanGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Err(PlannerError::Generation {
                message: "service unavailable".to_string(),
            })
        }
    }

    struct StaticResearch(&'static str);

    #[async_trait]
    impl ResearchProvider for StaticResearch {
        async fn best_practices(&self, _topic: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenResearch;

    #[async_trait]
    impl ResearchProvider for BrokenResearch {
        async fn best_practices(&self, _topic: &str) -> Result<String> {
            Err(PlannerError::Generation {
                message: "rate limited".to_string(),
            })
        }
    }

    const REPLY: &str = r#"```json
{"projectName": "CLI Todo", "phases": [{"number": 1, "name": "Core", "tasks": [
  {"id": "phase1-task1", "title": "Model"},
  {"id": "phase1-task2", "title": "Commands", "dependencies": ["phase1-task1"]}
]}]}
```"#;

    #[tokio::test]
    async fn test_generate_with_research() {
        let generator = CannedGenerator::new(REPLY);
        let research = StaticResearch("Prefer small commits.");
        let request = PlanRequest {
            features: vec!["add".to_string(), "list".to_string()],
            ..PlanRequest::new("A todo CLI")
        };

        let raw = generate_raw_plan(&generator, Some(&research), &request)
            .await
            .unwrap();
        assert_eq!(raw.project_name, "CLI Todo");
        assert_eq!(raw.phases[0].tasks.len(), 2);

        let prompt = generator.last_prompt();
        assert!(prompt.contains("A todo CLI"));
        assert!(prompt.contains("- list"));
        assert!(prompt.contains("## Best practices\nPrefer small commits."));
    }

    #[tokio::test]
    async fn test_research_failure_degrades() {
        let generator = CannedGenerator::new(REPLY);
        let raw = generate_raw_plan(&generator, Some(&BrokenResearch), &PlanRequest::new("Todo"))
            .await
            .unwrap();

        assert_eq!(raw.phases.len(), 1);
        assert!(!generator.last_prompt().contains("Best practices"));
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let result = generate_raw_plan(&FailingGenerator, None, &PlanRequest::new("Todo")).await;
        assert!(matches!(result, Err(PlannerError::Generation { .. })));
    }

    #[tokio::test]
    async fn test_unreadable_reply_is_adapter_error() {
        let generator = CannedGenerator::new("Sorry, I cannot help with that.");
        let result = generate_raw_plan(&generator, None, &PlanRequest::new("Todo")).await;
        assert!(matches!(result, Err(PlannerError::Adapter { .. })));
    }

    #[tokio::test]
    async fn test_empty_idea_is_rejected() {
        let generator = CannedGenerator::new(REPLY);
        let result = generate_raw_plan(&generator, None, &PlanRequest::new("  ")).await;
        assert!(matches!(result, Err(PlannerError::InvalidInput { .. })));
        assert!(generator.last_prompt().is_empty());
    }

    #[test]
    fn test_prompt_with_existing_document() {
        let request = PlanRequest {
            existing_document: Some("Users can sign in.".to_string()),
            ..PlanRequest::new("Auth service")
        };
        let prompt = request.prompt(None);
        assert!(prompt.contains("## Requirements document\nUsers can sign in."));
        assert!(prompt.contains("phase{N}-task{M}"));
    }
}
