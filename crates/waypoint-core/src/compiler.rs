//! Plan compiler: validates a [`RawPlan`] into an immutable [`Plan`].
//!
//! Validation is fail-fast and runs in a fixed order so that the reported
//! error is always the first category hit:
//!
//! 1. empty plan / empty phase
//! 2. task id well-formedness
//! 3. task id uniqueness
//! 4. contiguous phase numbering, then id-to-phase agreement
//! 5. dependency resolvability
//! 6. self-dependency
//! 7. acyclicity (Kahn's algorithm)
//!
//! Nothing is repaired or dropped silently. The only normalization is
//! collapsing repeated entries within one task's dependency list.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;

use crate::{
    error::CompileError,
    models::{Phase, Plan, RawPlan, Task, TaskId},
};

/// Compiles a raw plan into a validated [`Plan`].
///
/// # Errors
///
/// Returns the first [`CompileError`] encountered, in the order documented on
/// this module.
pub fn compile(raw: &RawPlan) -> Result<Plan, CompileError> {
    if raw.phases.is_empty() {
        return Err(CompileError::EmptyPlan);
    }
    if let Some(phase) = raw.phases.iter().find(|phase| phase.tasks.is_empty()) {
        return Err(CompileError::EmptyPhase {
            phase: phase.number,
        });
    }

    // Ids first, so every later check works on parsed ids.
    let mut parsed: Vec<Vec<TaskId>> = Vec::with_capacity(raw.phases.len());
    for phase in &raw.phases {
        let ids = phase
            .tasks
            .iter()
            .map(|task| {
                task.id
                    .parse::<TaskId>()
                    .map_err(|_| CompileError::MalformedTaskId {
                        id: task.id.clone(),
                        phase: phase.number,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        parsed.push(ids);
    }

    let mut seen: HashMap<TaskId, u32> = HashMap::new();
    for (phase, ids) in raw.phases.iter().zip(&parsed) {
        for id in ids {
            if let Some(first_phase) = seen.insert(id.clone(), phase.number) {
                return Err(CompileError::DuplicateTaskId {
                    id: id.to_string(),
                    first_phase,
                    second_phase: phase.number,
                });
            }
        }
    }

    check_phase_numbers(raw)?;
    for (phase, ids) in raw.phases.iter().zip(&parsed) {
        if let Some(id) = ids.iter().find(|id| id.phase() != phase.number) {
            return Err(CompileError::TaskPhaseMismatch {
                id: id.to_string(),
                phase: phase.number,
                id_phase: id.phase(),
            });
        }
    }

    let mut phases = Vec::with_capacity(raw.phases.len());
    for (raw_phase, ids) in raw.phases.iter().zip(parsed) {
        let mut tasks = Vec::with_capacity(ids.len());
        for (raw_task, id) in raw_phase.tasks.iter().zip(ids) {
            let mut dependencies: Vec<TaskId> = Vec::with_capacity(raw_task.dependencies.len());
            for reference in &raw_task.dependencies {
                let dependency = reference
                    .parse::<TaskId>()
                    .ok()
                    .filter(|dep| seen.contains_key(dep))
                    .ok_or_else(|| CompileError::DanglingDependency {
                        task: id.to_string(),
                        dependency: reference.clone(),
                    })?;
                if !dependencies.contains(&dependency) {
                    dependencies.push(dependency);
                }
            }
            tasks.push(Task {
                id,
                title: raw_task.title.clone(),
                description: raw_task.description.clone(),
                phase_number: raw_phase.number,
                dependencies,
                parallelizable: raw_task.parallelizable,
            });
        }
        phases.push(Phase {
            number: raw_phase.number,
            name: raw_phase.name.clone(),
            description: raw_phase.description.clone(),
            entry_criteria: raw_phase.entry_criteria.clone(),
            exit_criteria: raw_phase.exit_criteria.clone(),
            tasks,
        });
    }

    if let Some(task) = phases
        .iter()
        .flat_map(|phase| &phase.tasks)
        .find(|task| task.dependencies.contains(&task.id))
    {
        return Err(CompileError::SelfDependency {
            task: task.id.to_string(),
        });
    }

    // The input phases may be declared out of order; the model is ordered.
    phases.sort_by_key(|phase| phase.number);
    let total_tasks = phases.iter().map(|phase| phase.tasks.len()).sum();
    let plan = Plan {
        project_name: raw.project_name.clone(),
        summary: raw.summary.clone(),
        goals: raw.goals.clone(),
        phases,
        total_tasks,
    };

    topological_order(&plan)?;
    debug!(
        "Compiled plan '{}' with {} phases and {} tasks",
        plan.project_name,
        plan.phases.len(),
        plan.total_tasks
    );

    Ok(plan)
}

/// Phase numbers must be exactly `1..=n` with no duplicates.
fn check_phase_numbers(raw: &RawPlan) -> Result<(), CompileError> {
    let mut found: Vec<u32> = raw.phases.iter().map(|phase| phase.number).collect();
    found.sort_unstable();
    let expected_last = u32::try_from(found.len()).unwrap_or(u32::MAX);

    let contiguous = found
        .iter()
        .zip(1..=expected_last)
        .all(|(number, expected)| *number == expected);
    if contiguous {
        Ok(())
    } else {
        Err(CompileError::NonContiguousPhases {
            expected_last,
            found,
        })
    }
}

/// Returns every task id in an order where each task follows its
/// dependencies. Ties are broken by declaration order.
///
/// # Errors
///
/// Returns [`CompileError::DependencyCycle`] naming the members of one cycle
/// if the graph is not acyclic.
pub fn topological_order(plan: &Plan) -> Result<Vec<TaskId>, CompileError> {
    let tasks: Vec<&Task> = plan.tasks().collect();
    let position: HashMap<&TaskId, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, task)| (&task.id, i))
        .collect();

    // Edges run dependency -> dependent.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    let mut in_degree: Vec<usize> = vec![0; tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dependency in &task.dependencies {
            if let Some(&d) = position.get(dependency) {
                dependents[d].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut ready: VecDeque<usize> = (0..tasks.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());
    while let Some(i) = ready.pop_front() {
        order.push(tasks[i].id.clone());
        for &next in &dependents[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push_back(next);
            }
        }
    }

    if order.len() == tasks.len() {
        return Ok(order);
    }

    let remaining: HashSet<usize> = (0..tasks.len()).filter(|&i| in_degree[i] > 0).collect();
    Err(CompileError::DependencyCycle {
        members: extract_cycle(&tasks, &position, &remaining),
    })
}

/// Walks dependency edges inside the unsorted remainder until a task repeats.
///
/// Every task left over by Kahn's algorithm has at least one dependency that
/// is also left over, so the walk always closes a cycle.
fn extract_cycle(
    tasks: &[&Task],
    position: &HashMap<&TaskId, usize>,
    remaining: &HashSet<usize>,
) -> Vec<String> {
    let Some(mut current) = (0..tasks.len()).find(|i| remaining.contains(i)) else {
        return Vec::new();
    };

    let mut path: Vec<usize> = Vec::new();
    let mut visited_at: HashMap<usize, usize> = HashMap::new();
    loop {
        if let Some(&start) = visited_at.get(&current) {
            return path[start..]
                .iter()
                .map(|&i| tasks[i].id.to_string())
                .collect();
        }
        visited_at.insert(current, path.len());
        path.push(current);

        let next = tasks[current]
            .dependencies
            .iter()
            .filter_map(|dependency| position.get(dependency).copied())
            .find(|i| remaining.contains(i));
        match next {
            Some(next) => current = next,
            None => return path.iter().map(|&i| tasks[i].id.to_string()).collect(),
        }
    }
}
