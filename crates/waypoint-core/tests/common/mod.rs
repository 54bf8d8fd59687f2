use waypoint_core::{store::StoreKind, Planner, PlannerBuilder};
use tempfile::TempDir;

/// Markdown plan used across the integration tests.
pub const MARKDOWN_PLAN: &str = "\
# Bookmark Service

Store and tag bookmarks.

## Phase 1: Core
- [ ] phase1-task1: Data model
  Depends on: none
- [ ] phase1-task2: Persistence
  Depends on: phase1-task1
- [ ] phase1-task3: Tagging
  Depends on: phase1-task1
  Parallelizable: yes

## Phase 2: API
- [ ] phase2-task1: HTTP handlers
  Depends on: phase1-task2, phase1-task3
";

/// Helper function to create a planner over a fresh state directory
pub async fn create_test_planner(backend: StoreKind) -> (TempDir, Planner) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let planner = open_planner(&temp_dir, backend).await;
    (temp_dir, planner)
}

/// Opens another planner over the same state directory
pub async fn open_planner(temp_dir: &TempDir, backend: StoreKind) -> Planner {
    PlannerBuilder::new()
        .with_state_dir(Some(temp_dir.path().join(".waypoint")))
        .with_backend(backend)
        .build()
        .await
        .expect("Failed to create planner")
}
