//! Persistence for the compiled plan and its progress state.
//!
//! Stores are synchronous; the async [`crate::Planner`] runs them on the
//! blocking thread pool. Both implementations guarantee that a failed save
//! leaves the previously persisted data readable:
//!
//! - [`FileStore`] writes `plan.json` and `progress.json` through a temporary
//!   file in the same directory and renames it over the target.
//! - [`SqliteStore`] performs every save inside a single transaction.
//!
//! Plans are persisted in compiled form and recompiled on load, so a
//! hand-edited plan file is validated exactly like generator output.

use std::{fmt, path::Path, sync::Arc};

use crate::{
    error::Result,
    models::{Plan, ProgressState},
};

pub mod file;
pub mod sqlite;

pub use file::FileStore;
pub use sqlite::SqliteStore;

/// Storage backend for one project's plan and progress.
pub trait ProgressStore: Send + Sync {
    /// Where the data lives, for diagnostics.
    fn location(&self) -> &Path;

    /// Reads and recompiles the persisted plan. `None` when nothing has been
    /// written yet.
    fn load_plan(&self) -> Result<Option<Plan>>;

    /// Reads the persisted progress state. `None` when nothing has been
    /// written yet.
    fn load_state(&self) -> Result<Option<ProgressState>>;

    /// Replaces the persisted progress state.
    fn save_state(&self, state: &ProgressState) -> Result<()>;

    /// Replaces both the plan and the progress state.
    fn save_snapshot(&self, plan: &Plan, state: &ProgressState) -> Result<()>;
}

/// Available storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// JSON files in the state directory
    #[default]
    Json,
    /// A single SQLite database in the state directory
    Sqlite,
}

impl StoreKind {
    /// Opens a store of this kind rooted at `dir`.
    pub fn open(self, dir: &Path) -> Arc<dyn ProgressStore> {
        match self {
            StoreKind::Json => Arc::new(FileStore::new(dir)),
            StoreKind::Sqlite => Arc::new(SqliteStore::new(dir.join(sqlite::DATABASE_FILE))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Json => "json",
            StoreKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
