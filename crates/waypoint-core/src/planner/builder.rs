//! Builder for creating and configuring Planner instances.

use std::path::{Path, PathBuf};

use log::debug;
use tokio::task;

use super::Planner;
use crate::{
    error::{PlannerError, Result},
    store::StoreKind,
};

/// State directory used when none is configured, relative to the working
/// directory.
pub const DEFAULT_STATE_DIR: &str = ".waypoint";

/// Builder for creating and configuring Planner instances.
#[derive(Debug, Clone, Default)]
pub struct PlannerBuilder {
    state_dir: Option<PathBuf>,
    backend: StoreKind,
}

impl PlannerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory holding the plan and progress.
    ///
    /// If not specified, [`DEFAULT_STATE_DIR`] under the current directory
    /// is used.
    pub fn with_state_dir<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.state_dir = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Selects the storage backend. Defaults to JSON files.
    pub fn with_backend(mut self, backend: StoreKind) -> Self {
        self.backend = backend;
        self
    }

    /// Builds the configured planner instance.
    ///
    /// Nothing is written until the first plan is compiled.
    ///
    /// # Errors
    ///
    /// Returns `PlannerError::Configuration` if the state path exists but is
    /// not a directory.
    pub async fn build(self) -> Result<Planner> {
        let state_dir = self
            .state_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));

        let checked = state_dir.clone();
        task::spawn_blocking(move || {
            if checked.exists() && !checked.is_dir() {
                return Err(PlannerError::Configuration {
                    message: format!("State path '{}' is not a directory", checked.display()),
                });
            }
            Ok(())
        })
        .await
        .map_err(|e| PlannerError::Configuration {
            message: format!("Task join error: {e}"),
        })??;

        debug!(
            "Using {} store in {}",
            self.backend,
            state_dir.display()
        );
        Ok(Planner::new(self.backend.open(&state_dir)))
    }
}
