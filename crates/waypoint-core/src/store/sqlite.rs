//! SQLite store: the plan document plus normalized progress tables.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use log::debug;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Transaction};

use super::ProgressStore;
use crate::{
    compiler::compile,
    error::{DatabaseResultExt, PlannerError, Result, StorageResultExt},
    models::{Checkpoint, Plan, ProgressRecord, ProgressState, RawPlan, TaskId, TaskStatus},
};

/// File name of the database inside the state directory.
pub const DATABASE_FILE: &str = "waypoint.db";

const SELECT_PLAN_SQL: &str = "SELECT body FROM plan_documents WHERE id = 1";
const UPSERT_PLAN_SQL: &str = "INSERT INTO plan_documents (id, body, updated_at) VALUES (1, ?1, ?2) \
     ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at";
const SELECT_META_SQL: &str = "SELECT current_phase, last_updated FROM progress_meta WHERE id = 1";
const UPSERT_META_SQL: &str = "INSERT INTO progress_meta (id, current_phase, last_updated) VALUES (1, ?1, ?2) \
     ON CONFLICT(id) DO UPDATE SET current_phase = excluded.current_phase, last_updated = excluded.last_updated";
const SELECT_TASKS_SQL: &str = "SELECT task_id, status, completed_at, notes FROM task_progress";
const DELETE_TASKS_SQL: &str = "DELETE FROM task_progress";
const INSERT_TASK_SQL: &str =
    "INSERT INTO task_progress (task_id, status, completed_at, notes) VALUES (?1, ?2, ?3, ?4)";
const SELECT_CHECKPOINTS_SQL: &str =
    "SELECT phase, task, summary, created_at FROM checkpoints ORDER BY seq";
const COUNT_CHECKPOINTS_SQL: &str = "SELECT COUNT(*) FROM checkpoints";
const INSERT_CHECKPOINT_SQL: &str =
    "INSERT INTO checkpoints (phase, task, summary, created_at) VALUES (?1, ?2, ?3, ?4)";

/// Stores the plan and progress in one SQLite database.
///
/// A connection is opened per operation, so the store itself is cheap to
/// share between threads.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

/// Maps a text column that failed to parse into a rusqlite conversion error.
fn conversion_error(
    column: usize,
    error: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error))
}

fn parse_column<T>(value: &str, column: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    value.parse::<T>().map_err(|message| {
        conversion_error(
            column,
            std::io::Error::new(std::io::ErrorKind::InvalidData, message),
        )
    })
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<Timestamp> {
    value
        .parse::<Timestamp>()
        .map_err(|e| conversion_error(column, e))
}

impl SqliteStore {
    /// Creates a store for the database at `path`. The file and schema are
    /// created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens a connection and makes sure the schema exists.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .storage_context("Failed to create state directory", parent)?;
        }

        let connection =
            Connection::open(&self.path).db_context("Failed to open database connection")?;
        connection
            .execute_batch(include_str!("../../assets/schema.sql"))
            .db_context("Failed to initialize database schema")?;
        Ok(connection)
    }

    fn write_plan(tx: &Transaction<'_>, plan: &Plan) -> Result<()> {
        let body = serde_json::to_string(plan)?;
        tx.execute(UPSERT_PLAN_SQL, params![body, Timestamp::now().to_string()])
            .db_context("Failed to store plan")?;
        Ok(())
    }

    fn write_state(tx: &Transaction<'_>, state: &ProgressState) -> Result<()> {
        tx.execute(
            UPSERT_META_SQL,
            params![state.current_phase, state.last_updated.to_string()],
        )
        .db_context("Failed to store progress metadata")?;

        tx.execute(DELETE_TASKS_SQL, [])
            .db_context("Failed to clear task progress")?;
        {
            let mut insert = tx
                .prepare(INSERT_TASK_SQL)
                .db_context("Failed to prepare task insert")?;
            for (id, record) in &state.tasks {
                insert
                    .execute(params![
                        id.as_str(),
                        record.status.as_str(),
                        record.completed_at.map(|t| t.to_string()),
                        record.notes.as_deref(),
                    ])
                    .db_context("Failed to store task progress")?;
            }
        }

        // Checkpoints are append-only: only entries beyond the stored ones
        // are inserted, and a shorter history is refused.
        let stored: i64 = tx
            .query_row(COUNT_CHECKPOINTS_SQL, [], |row| row.get(0))
            .db_context("Failed to count checkpoints")?;
        let stored = usize::try_from(stored).unwrap_or(0);
        if state.checkpoints.len() < stored {
            return Err(PlannerError::invalid_input("checkpoints").with_reason(format!(
                "{} checkpoints stored but only {} supplied; history is append-only",
                stored,
                state.checkpoints.len()
            )));
        }

        let mut insert = tx
            .prepare(INSERT_CHECKPOINT_SQL)
            .db_context("Failed to prepare checkpoint insert")?;
        for checkpoint in &state.checkpoints[stored..] {
            insert
                .execute(params![
                    checkpoint.phase,
                    checkpoint.task,
                    checkpoint.summary,
                    checkpoint.created_at.to_string(),
                ])
                .db_context("Failed to append checkpoint")?;
        }

        Ok(())
    }
}

impl ProgressStore for SqliteStore {
    fn location(&self) -> &Path {
        &self.path
    }

    fn load_plan(&self) -> Result<Option<Plan>> {
        let connection = self.open()?;
        let body: Option<String> = connection
            .query_row(SELECT_PLAN_SQL, [], |row| row.get(0))
            .optional()
            .db_context("Failed to query plan")?;

        match body {
            Some(body) => {
                let raw: RawPlan = serde_json::from_str(&body)?;
                Ok(Some(compile(&raw)?))
            }
            None => Ok(None),
        }
    }

    fn load_state(&self) -> Result<Option<ProgressState>> {
        let connection = self.open()?;

        let meta = connection
            .query_row(SELECT_META_SQL, [], |row| {
                let current_phase: u32 = row.get(0)?;
                let last_updated = parse_timestamp(&row.get::<_, String>(1)?, 1)?;
                Ok((current_phase, last_updated))
            })
            .optional()
            .db_context("Failed to query progress metadata")?;
        let Some((current_phase, last_updated)) = meta else {
            return Ok(None);
        };

        let mut stmt = connection
            .prepare(SELECT_TASKS_SQL)
            .db_context("Failed to prepare task query")?;
        let tasks = stmt
            .query_map([], |row| {
                let id: TaskId = parse_column(&row.get::<_, String>(0)?, 0)?;
                let status: TaskStatus = parse_column(&row.get::<_, String>(1)?, 1)?;
                let completed_at = row
                    .get::<_, Option<String>>(2)?
                    .map(|value| parse_timestamp(&value, 2))
                    .transpose()?;
                Ok((
                    id,
                    ProgressRecord {
                        status,
                        completed_at,
                        notes: row.get(3)?,
                    },
                ))
            })
            .db_context("Failed to query task progress")?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()
            .db_context("Failed to read task progress")?;

        let mut stmt = connection
            .prepare(SELECT_CHECKPOINTS_SQL)
            .db_context("Failed to prepare checkpoint query")?;
        let checkpoints = stmt
            .query_map([], |row| {
                Ok(Checkpoint {
                    phase: row.get(0)?,
                    task: row.get(1)?,
                    summary: row.get(2)?,
                    created_at: parse_timestamp(&row.get::<_, String>(3)?, 3)?,
                })
            })
            .db_context("Failed to query checkpoints")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read checkpoints")?;

        Ok(Some(ProgressState {
            current_phase,
            tasks,
            checkpoints,
            last_updated,
        }))
    }

    fn save_state(&self, state: &ProgressState) -> Result<()> {
        let mut connection = self.open()?;
        let tx = connection
            .transaction()
            .db_context("Failed to begin transaction")?;
        Self::write_state(&tx, state)?;
        tx.commit().db_context("Failed to commit transaction")?;

        debug!("Saved progress to {}", self.path.display());
        Ok(())
    }

    fn save_snapshot(&self, plan: &Plan, state: &ProgressState) -> Result<()> {
        let mut connection = self.open()?;
        let tx = connection
            .transaction()
            .db_context("Failed to begin transaction")?;
        Self::write_plan(&tx, plan)?;
        Self::write_state(&tx, state)?;
        tx.commit().db_context("Failed to commit transaction")?;

        debug!("Saved plan and progress to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::{RawPhase, RawTask};

    fn test_plan(task_ids: &[&str]) -> Plan {
        compile(&RawPlan {
            project_name: "SQLite Store".to_string(),
            phases: vec![RawPhase {
                number: 1,
                tasks: task_ids
                    .iter()
                    .map(|id| RawTask {
                        id: id.to_string(),
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap()
    }

    fn create_test_store() -> (TempDir, SqliteStore) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = SqliteStore::new(temp_dir.path().join(DATABASE_FILE));
        (temp_dir, store)
    }

    #[test]
    fn test_empty_database_loads_as_none() {
        let (_temp_dir, store) = create_test_store();
        assert!(store.load_plan().unwrap().is_none());
        assert!(store.load_state().unwrap().is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (_temp_dir, store) = create_test_store();
        let plan = test_plan(&["phase1-task1", "phase1-task2"]);
        let mut state = ProgressState::initialize(&plan);
        let task: TaskId = "phase1-task1".parse().unwrap();
        state
            .transition(&task, TaskStatus::Completed, Some("shipped".to_string()))
            .unwrap();
        state
            .append_checkpoint(1, "phase1-task1", "Finished the first task")
            .unwrap();

        store.save_snapshot(&plan, &state).unwrap();
        assert_eq!(store.load_plan().unwrap().unwrap(), plan);
        assert_eq!(store.load_state().unwrap().unwrap(), state);
    }

    #[test]
    fn test_checkpoints_accumulate_across_saves() {
        let (_temp_dir, store) = create_test_store();
        let plan = test_plan(&["phase1-task1"]);
        let mut state = ProgressState::initialize(&plan);
        store.save_snapshot(&plan, &state).unwrap();

        state.append_checkpoint(1, "phase1-task1", "one").unwrap();
        store.save_state(&state).unwrap();
        state.append_checkpoint(1, "phase1-task1", "two").unwrap();
        store.save_state(&state).unwrap();

        let loaded = store.load_state().unwrap().unwrap();
        let summaries: Vec<_> = loaded.checkpoints.iter().map(|c| c.summary.as_str()).collect();
        assert_eq!(summaries, vec!["one", "two"]);

        // A state with a shorter history may not overwrite the trail.
        let stale = ProgressState::initialize(&plan);
        assert!(matches!(
            store.save_state(&stale),
            Err(PlannerError::InvalidInput { .. })
        ));
        assert_eq!(store.load_state().unwrap().unwrap().checkpoints.len(), 2);
    }

    #[test]
    fn test_failed_transaction_keeps_previous_state() {
        let (_temp_dir, store) = create_test_store();
        let plan = test_plan(&["phase1-task1"]);
        let mut state = ProgressState::initialize(&plan);
        store.save_snapshot(&plan, &state).unwrap();
        let before = store.load_state().unwrap().unwrap();

        // Abort the write after the task rows have already been replaced.
        store
            .open()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER fail_checkpoint BEFORE INSERT ON checkpoints \
                 BEGIN SELECT RAISE(ABORT, 'simulated failure'); END;",
            )
            .unwrap();

        let task: TaskId = "phase1-task1".parse().unwrap();
        state
            .transition(&task, TaskStatus::Completed, None)
            .unwrap();
        state.append_checkpoint(1, "phase1-task1", "done").unwrap();
        assert!(matches!(
            store.save_state(&state),
            Err(PlannerError::Database { .. })
        ));

        assert_eq!(store.load_state().unwrap().unwrap(), before);
    }
}
