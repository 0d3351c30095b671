//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tm_core::Config;
use tm_db::{Database, DuckDbBackend};

use crate::cli::GlobalArgs;

/// A loaded project: its root directory and parsed configuration.
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Absolute path of the migrations directory
    pub(crate) fn migrations_dir(&self) -> PathBuf {
        self.config.migrations_path_absolute(&self.root)
    }
}

/// Load the project config, honouring `--config` over the project directory.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => Config::load_from_dir(&root)
            .with_context(|| format!("Failed to load project at {}", root.display()))?,
    };
    log::debug!("Loaded project '{}' from {}", config.name, root.display());
    Ok(Project { root, config })
}

/// Resolve the database path: `--database` wins, then the config value.
///
/// Relative file paths are taken relative to the project root.
pub(crate) fn database_path(global: &GlobalArgs, project: &Project) -> String {
    let path = global
        .database
        .as_deref()
        .unwrap_or(&project.config.database.path);
    if path == ":memory:" || Path::new(path).is_absolute() {
        path.to_string()
    } else {
        project.root.join(path).display().to_string()
    }
}

/// Open the configured database.
pub(crate) fn open_database(global: &GlobalArgs, project: &Project) -> Result<Arc<dyn Database>> {
    let path = database_path(global, project);
    log::debug!(
        "Opening {} database at {path}",
        project.config.database.db_type
    );
    let db = DuckDbBackend::new(&path).with_context(|| format!("Failed to open database {path}"))?;
    Ok(Arc::new(db))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
