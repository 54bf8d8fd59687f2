//! Plan operations for the Planner: compiling, generating and querying.

use log::{info, warn};

use super::{load_context, Planner};
use crate::{
    compiler::{compile, topological_order},
    display::{CompileResult, PlanOverview, Reconciliation},
    error::Result,
    generate::{generate_raw_plan, PlanGenerator, PlanRequest, ResearchProvider},
    models::{Plan, ProgressState, RawPlan, TaskId},
    resolver::{self, NextTask, ProgressSummary},
    store::ProgressStore,
};

/// Diffs the previous state's task ids against the reconciled one.
fn reconciliation(previous: &ProgressState, current: &ProgressState) -> Reconciliation {
    Reconciliation {
        retained: current
            .tasks
            .keys()
            .filter(|id| previous.tasks.contains_key(*id))
            .count(),
        added: current
            .tasks
            .keys()
            .filter(|id| !previous.tasks.contains_key(*id))
            .cloned()
            .collect(),
        dropped: previous
            .tasks
            .keys()
            .filter(|id| !current.tasks.contains_key(*id))
            .cloned()
            .collect(),
    }
}

/// Initializes or reconciles progress for `plan` and stores both.
fn store_compiled(store: &dyn ProgressStore, plan: Plan) -> Result<CompileResult> {
    let (state, reconciled) = match store.load_state()? {
        Some(previous) => {
            let mut state = previous.reconcile(&plan);
            if plan.phase(state.current_phase).is_none() {
                warn!(
                    "Phase {} no longer exists; continuing from phase {}",
                    state.current_phase,
                    plan.last_phase()
                );
                state.current_phase = plan.last_phase();
            }
            let diff = reconciliation(&previous, &state);
            (state, Some(diff))
        }
        None => (ProgressState::initialize(&plan), None),
    };

    store.save_snapshot(&plan, &state)?;
    info!(
        "Stored plan '{}' with {} tasks in {}",
        plan.project_name,
        plan.total_tasks,
        store.location().display()
    );

    Ok(CompileResult {
        project_name: plan.project_name.clone(),
        phases: plan.phases.len(),
        total_tasks: plan.total_tasks,
        current_phase: state.current_phase,
        reconciliation: reconciled,
    })
}

impl Planner {
    /// Compiles a raw plan and makes it the project's plan.
    ///
    /// The first plan initializes every task as pending. A later plan is a
    /// regeneration: progress for task ids it keeps carries forward, new ids
    /// start pending and ids it drops are discarded along with their records.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::Compile` when validation fails; nothing is
    /// written in that case.
    pub async fn compile_plan(&self, raw: RawPlan) -> Result<CompileResult> {
        let plan = compile(&raw)?;
        self.with_store(move |store| store_compiled(store, plan)).await
    }

    /// Generates a plan through `generator`, then compiles and stores it like
    /// [`Planner::compile_plan`].
    pub async fn generate_plan(
        &self,
        generator: &dyn PlanGenerator,
        research: Option<&dyn ResearchProvider>,
        request: &PlanRequest,
    ) -> Result<CompileResult> {
        let raw = generate_raw_plan(generator, research, request).await?;
        self.compile_plan(raw).await
    }

    /// Computes the next actionable task of the current phase.
    pub async fn next_task(&self) -> Result<NextTask> {
        self.with_store(|store| {
            let (plan, state) = load_context(store)?;
            resolver::next_task(&plan, &state)
        })
        .await
    }

    /// Task counts per phase and overall.
    pub async fn progress_summary(&self) -> Result<ProgressSummary> {
        self.with_store(|store| {
            let (plan, state) = load_context(store)?;
            Ok(resolver::summarize(&plan, &state))
        })
        .await
    }

    /// The stored plan together with its progress, for rendering.
    pub async fn show_plan(&self) -> Result<PlanOverview> {
        self.with_store(|store| {
            let (plan, state) = load_context(store)?;
            Ok(PlanOverview::new(plan, state))
        })
        .await
    }

    /// Every task id of the stored plan in a dependency-respecting order.
    pub async fn execution_order(&self) -> Result<Vec<TaskId>> {
        self.with_store(|store| {
            let (plan, _) = load_context(store)?;
            Ok(topological_order(&plan)?)
        })
        .await
    }
}
