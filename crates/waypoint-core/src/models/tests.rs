#[cfg(test)]
mod model_tests {
    use jiff::Timestamp;

    use crate::{
        compiler::compile,
        error::PlannerError,
        models::{Plan, ProgressRecord, ProgressState, RawPhase, RawPlan, RawTask, TaskId, TaskStatus},
    };

    fn id(s: &str) -> TaskId {
        s.parse().unwrap()
    }

    fn raw_plan(task_ids: &[&str]) -> RawPlan {
        RawPlan {
            project_name: "Model Test".to_string(),
            summary: "Testing progress state".to_string(),
            goals: vec!["Keep completed work".to_string()],
            phases: vec![RawPhase {
                number: 1,
                name: "Only phase".to_string(),
                tasks: task_ids
                    .iter()
                    .map(|task_id| RawTask {
                        id: task_id.to_string(),
                        title: format!("Task {task_id}"),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
        }
    }

    fn create_test_plan(task_ids: &[&str]) -> Plan {
        compile(&raw_plan(task_ids)).unwrap()
    }

    #[test]
    fn test_initialize_creates_pending_records() {
        let plan = create_test_plan(&["phase1-task1", "phase1-task2"]);
        let state = ProgressState::initialize(&plan);

        assert_eq!(state.current_phase, 1);
        assert_eq!(state.tasks.len(), 2);
        assert!(state.checkpoints.is_empty());
        for record in state.tasks.values() {
            assert_eq!(record, &ProgressRecord::default());
        }
    }

    #[test]
    fn test_legal_transitions() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));

        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::InProgress));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Pending.can_transition_to(TaskStatus::Pending));
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Completed));
    }

    #[test]
    fn test_transition_sets_completed_at_only_on_completion() {
        let plan = create_test_plan(&["phase1-task1"]);
        let mut state = ProgressState::initialize(&plan);
        let task = id("phase1-task1");

        let record = state
            .transition(&task, TaskStatus::InProgress, Some("started".to_string()))
            .unwrap();
        assert_eq!(record.status, TaskStatus::InProgress);
        assert!(record.completed_at.is_none());
        assert_eq!(record.notes.as_deref(), Some("started"));

        let record = state
            .transition(&task, TaskStatus::Completed, None)
            .unwrap();
        assert!(record.completed_at.is_some());
        // Notes survive a transition without a new note
        assert_eq!(record.notes.as_deref(), Some("started"));
    }

    #[test]
    fn test_illegal_transition_leaves_state_unchanged() {
        let plan = create_test_plan(&["phase1-task1"]);
        let mut state = ProgressState::initialize(&plan);
        let task = id("phase1-task1");
        state
            .transition(&task, TaskStatus::Completed, None)
            .unwrap();
        let before = state.clone();

        let err = state
            .transition(&task, TaskStatus::Pending, Some("undo".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::IllegalTransition {
                from: TaskStatus::Completed,
                to: TaskStatus::Pending,
                ..
            }
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn test_unknown_task_is_rejected() {
        let plan = create_test_plan(&["phase1-task1"]);
        let mut state = ProgressState::initialize(&plan);
        let before = state.clone();

        let err = state
            .transition(&id("phase1-task9"), TaskStatus::InProgress, None)
            .unwrap_err();
        assert!(matches!(err, PlannerError::UnknownTask { ref id } if id == "phase1-task9"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_checkpoints_are_append_only() {
        let plan = create_test_plan(&["phase1-task1"]);
        let mut state = ProgressState::initialize(&plan);

        state
            .append_checkpoint(1, "phase1-task1", "Scaffolded the crate")
            .unwrap();
        state
            .append_checkpoint(1, "phase1-task1", "Added tests")
            .unwrap();
        assert_eq!(state.checkpoints.len(), 2);
        assert_eq!(state.checkpoints[0].summary, "Scaffolded the crate");
        assert_eq!(state.checkpoints[1].summary, "Added tests");

        assert!(state.append_checkpoint(1, "phase1-task1", "  ").is_err());
        assert_eq!(state.checkpoints.len(), 2);
    }

    #[test]
    fn test_reconcile_preserves_drops_and_adds() {
        let plan = create_test_plan(&["phase1-task1", "phase1-task2"]);
        let mut state = ProgressState::initialize(&plan);
        state
            .transition(&id("phase1-task1"), TaskStatus::Completed, Some("done".to_string()))
            .unwrap();
        state
            .append_checkpoint(1, "phase1-task1", "First task finished")
            .unwrap();

        // Same ids plus a new one: completed status carries forward.
        let grown = create_test_plan(&["phase1-task1", "phase1-task2", "phase1-task9"]);
        let reconciled = state.reconcile(&grown);
        assert_eq!(reconciled.tasks[&id("phase1-task1")], state.tasks[&id("phase1-task1")]);
        assert_eq!(reconciled.status(&id("phase1-task9")), Some(TaskStatus::Pending));
        assert_eq!(reconciled.checkpoints, state.checkpoints);
        assert_eq!(reconciled.current_phase, state.current_phase);

        // Dropping the completed task removes its record.
        let shrunk = create_test_plan(&["phase1-task2"]);
        let reconciled = state.reconcile(&shrunk);
        assert!(!reconciled.tasks.contains_key(&id("phase1-task1")));
        assert_eq!(reconciled.tasks.len(), 1);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let plan = create_test_plan(&["phase1-task1", "phase1-task2"]);
        let mut state = ProgressState::initialize(&plan);
        state
            .transition(&id("phase1-task2"), TaskStatus::InProgress, None)
            .unwrap();

        let once = state.reconcile(&plan);
        let twice = once.reconcile(&plan);
        assert_eq!(once.tasks, twice.tasks);
        assert_eq!(once.tasks, state.tasks);
    }

    #[test]
    fn test_advance_phase_requires_completion() {
        let mut raw = raw_plan(&["phase1-task1"]);
        raw.phases.push(RawPhase {
            number: 2,
            name: "Second".to_string(),
            tasks: vec![RawTask {
                id: "phase2-task1".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        });
        let plan = compile(&raw).unwrap();
        let mut state = ProgressState::initialize(&plan);

        assert!(matches!(
            state.advance_phase(&plan),
            Err(PlannerError::PhaseIncomplete {
                phase: 1,
                remaining: 1
            })
        ));

        state
            .transition(&id("phase1-task1"), TaskStatus::Completed, None)
            .unwrap();
        assert_eq!(state.advance_phase(&plan).unwrap(), 2);

        state
            .transition(&id("phase2-task1"), TaskStatus::Completed, None)
            .unwrap();
        assert!(matches!(
            state.advance_phase(&plan),
            Err(PlannerError::NoNextPhase { phase: 2 })
        ));
        assert_eq!(state.current_phase, 2);
    }

    #[test]
    fn test_persisted_form() {
        let plan = create_test_plan(&["phase1-task1", "phase1-task2"]);
        let mut state = ProgressState::initialize(&plan);
        state.last_updated = Timestamp::from_second(1640995200).unwrap();
        state.tasks.get_mut(&id("phase1-task1")).unwrap().status = TaskStatus::InProgress;

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["currentPhase"], 1);
        assert_eq!(json["tasks"]["phase1-task1"]["status"], "in_progress");
        assert_eq!(json["tasks"]["phase1-task2"]["status"], "pending");
        assert!(json["tasks"]["phase1-task2"].get("completedAt").is_none());
        assert_eq!(json["lastUpdated"], "2022-01-01T00:00:00Z");
        assert!(json["checkpoints"].as_array().unwrap().is_empty());

        let back: ProgressState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_plan_lowering_recompiles_identically() {
        let plan = create_test_plan(&["phase1-task1", "phase1-task2"]);
        let raw = RawPlan::from(&plan);
        assert_eq!(compile(&raw).unwrap(), plan);
    }
}
