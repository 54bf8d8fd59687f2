//! JSON file store with atomic replacement.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use log::{debug, warn};
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use super::ProgressStore;
use crate::{
    compiler::compile,
    error::{PlannerError, Result, StorageResultExt},
    models::{Plan, ProgressState, RawPlan},
};

/// File name of the persisted plan.
pub const PLAN_FILE: &str = "plan.json";
/// File name of the persisted progress state.
pub const PROGRESS_FILE: &str = "progress.json";

/// Stores the plan and progress as JSON documents in one directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. Nothing is touched until the first
    /// save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn plan_path(&self) -> PathBuf {
        self.dir.join(PLAN_FILE)
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    /// Creates the state directory and a temporary file inside it filled by
    /// `write`. The temporary file is removed again if anything fails.
    fn stage<F>(&self, write: F) -> Result<NamedTempFile>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        fs::create_dir_all(&self.dir).storage_context("Failed to create state directory", &self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)
            .storage_context("Failed to create temporary file", &self.dir)?;
        write(tmp.as_file_mut()).storage_context("Failed to write temporary file", tmp.path())?;
        tmp.as_file()
            .sync_all()
            .storage_context("Failed to sync temporary file", tmp.path())?;
        Ok(tmp)
    }

    /// Atomically moves a staged file over `target`.
    fn commit(tmp: NamedTempFile, target: &Path) -> Result<()> {
        tmp.persist(target).map_err(|e| PlannerError::Storage {
            message: "Failed to replace file".to_string(),
            path: target.to_path_buf(),
            source: e.error,
        })?;
        Ok(())
    }

    /// Writes `target` through a temporary file so readers only ever see the
    /// old or the new content.
    pub(crate) fn write_atomic<F>(&self, target: &Path, write: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let tmp = self.stage(write)?;
        Self::commit(tmp, target)
    }

    fn read_bytes(path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PlannerError::Storage {
                message: "Failed to read file".to_string(),
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let Some(content) = Self::read_bytes(path)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(&content)?))
    }

    /// Puts the plan file back the way it was before a failed snapshot.
    fn restore_plan(&self, previous: Option<&[u8]>) {
        let plan_path = self.plan_path();
        let restored = match previous {
            Some(bytes) => self.write_atomic(&plan_path, |file| file.write_all(bytes)),
            None => fs::remove_file(&plan_path).storage_context("Failed to remove file", &plan_path),
        };
        if let Err(e) = restored {
            warn!("Could not restore {}: {e}", plan_path.display());
        }
    }
}

fn to_json_bytes<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

impl ProgressStore for FileStore {
    fn location(&self) -> &Path {
        &self.dir
    }

    fn load_plan(&self) -> Result<Option<Plan>> {
        let Some(raw) = Self::read_json::<RawPlan>(&self.plan_path())? else {
            return Ok(None);
        };
        Ok(Some(compile(&raw)?))
    }

    fn load_state(&self) -> Result<Option<ProgressState>> {
        Self::read_json(&self.progress_path())
    }

    fn save_state(&self, state: &ProgressState) -> Result<()> {
        let bytes = to_json_bytes(state)?;
        self.write_atomic(&self.progress_path(), |file| file.write_all(&bytes))?;
        debug!("Saved progress to {}", self.progress_path().display());
        Ok(())
    }

    fn save_snapshot(&self, plan: &Plan, state: &ProgressState) -> Result<()> {
        let plan_bytes = to_json_bytes(plan)?;
        let state_bytes = to_json_bytes(state)?;

        // Stage both before replacing either. The plan goes first and is
        // rolled back if the state cannot follow; a crash in between leaves
        // the old state intact and is refused on load.
        let previous_plan = Self::read_bytes(&self.plan_path())?;
        let plan_tmp = self.stage(|file| file.write_all(&plan_bytes))?;
        let state_tmp = self.stage(|file| file.write_all(&state_bytes))?;
        Self::commit(plan_tmp, &self.plan_path())?;
        if let Err(e) = Self::commit(state_tmp, &self.progress_path()) {
            self.restore_plan(previous_plan.as_deref());
            return Err(e);
        }

        debug!("Saved plan and progress to {}", self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{RawPhase, RawTask, TaskId, TaskStatus};

    fn test_plan() -> Plan {
        compile(&RawPlan {
            project_name: "File Store".to_string(),
            phases: vec![RawPhase {
                number: 1,
                tasks: vec![
                    RawTask {
                        id: "phase1-task1".to_string(),
                        ..Default::default()
                    },
                    RawTask {
                        id: "phase1-task2".to_string(),
                        dependencies: vec!["phase1-task1".to_string()],
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_missing_files_load_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("state"));

        assert!(store.load_plan().unwrap().is_none());
        assert!(store.load_state().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("state"));
        let plan = test_plan();
        let state = ProgressState::initialize(&plan);

        store.save_snapshot(&plan, &state).unwrap();
        assert_eq!(store.load_plan().unwrap().unwrap(), plan);
        assert_eq!(store.load_state().unwrap().unwrap(), state);
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let plan = test_plan();
        let mut state = ProgressState::initialize(&plan);
        store.save_snapshot(&plan, &state).unwrap();

        let task: TaskId = "phase1-task1".parse().unwrap();
        state
            .transition(&task, TaskStatus::Completed, None)
            .unwrap();

        // Simulate a crash halfway through writing the new state.
        let bytes = serde_json::to_vec(&state).unwrap();
        let result = store.write_atomic(&store.progress_path(), |file| {
            file.write_all(&bytes[..bytes.len() / 2])?;
            Err(io::Error::other("disk full"))
        });
        assert!(matches!(result, Err(PlannerError::Storage { .. })));

        let loaded = store.load_state().unwrap().unwrap();
        assert_eq!(loaded.status(&task), Some(TaskStatus::Pending));

        // No temporary files are left behind.
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_failed_state_commit_restores_previous_plan() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        let mut small = test_plan();
        small.phases[0].tasks.truncate(1);
        small.total_tasks = 1;
        store
            .save_snapshot(&small, &ProgressState::initialize(&small))
            .unwrap();

        // A non-empty directory in place of progress.json makes the second
        // rename fail.
        fs::remove_file(store.progress_path()).unwrap();
        fs::create_dir(store.progress_path()).unwrap();
        fs::write(store.progress_path().join("keep"), "").unwrap();

        let larger = test_plan();
        let result = store.save_snapshot(&larger, &ProgressState::initialize(&larger));
        assert!(matches!(result, Err(PlannerError::Storage { .. })));

        let loaded = store.load_plan().unwrap().unwrap();
        assert_eq!(loaded.total_tasks, 1);
        assert_eq!(loaded, small);
    }

    #[test]
    fn test_failed_first_snapshot_leaves_no_plan() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        fs::create_dir(store.progress_path()).unwrap();
        fs::write(store.progress_path().join("keep"), "").unwrap();

        let plan = test_plan();
        assert!(store
            .save_snapshot(&plan, &ProgressState::initialize(&plan))
            .is_err());
        assert!(!store.plan_path().exists());
    }

    #[test]
    fn test_corrupt_plan_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());
        fs::write(
            store.plan_path(),
            r#"{"projectName": "Bad", "phases": [{"number": 2, "tasks": [{"id": "phase2-task1"}]}]}"#,
        )
        .unwrap();

        assert!(matches!(
            store.load_plan(),
            Err(PlannerError::Compile(_))
        ));
    }
}
