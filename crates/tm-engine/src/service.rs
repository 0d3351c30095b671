//! Public entry point: discover, check for drift, apply.

use crate::drift::find_pending;
use crate::error::{MigrateError, MigrateResult};
use crate::ledger::LedgerStore;
use crate::runner::MigrationRunner;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tm_core::config::DEFAULT_LEDGER_TABLE;
use tm_core::discover_migrations;
use tm_db::Database;

/// Outcome of a successful [`MigrationService::migrate`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Number of migration files discovered
    pub discovered: usize,

    /// Versions applied by this run, in the order they were applied
    pub applied: Vec<u32>,
}

impl MigrationReport {
    /// True when nothing was pending
    pub fn is_up_to_date(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Applies the migrations in one directory to one database.
///
/// The service owns the connection for its lifetime; nothing else should issue
/// queries on it while [`migrate`](Self::migrate) runs.
pub struct MigrationService {
    ledger: LedgerStore,
    migrations_dir: PathBuf,
    schema_ready: AtomicBool,
}

impl MigrationService {
    /// Create a service using the default `migrations` ledger table.
    pub fn initialize(
        db: Arc<dyn Database>,
        migrations_dir: impl Into<PathBuf>,
    ) -> MigrateResult<Self> {
        Self::initialize_with_ledger(db, migrations_dir, DEFAULT_LEDGER_TABLE)
    }

    /// Create a service recording applied migrations in `ledger_table`.
    ///
    /// Fails if the directory does not exist or the table name is not a plain
    /// identifier. Does not touch the database.
    pub fn initialize_with_ledger(
        db: Arc<dyn Database>,
        migrations_dir: impl Into<PathBuf>,
        ledger_table: &str,
    ) -> MigrateResult<Self> {
        let migrations_dir = migrations_dir.into();
        if !migrations_dir.is_dir() {
            return Err(MigrateError::MigrationsDirNotFound {
                path: migrations_dir.display().to_string(),
            });
        }
        let ledger = LedgerStore::new(db, ledger_table)?;

        Ok(Self {
            ledger,
            migrations_dir,
            schema_ready: AtomicBool::new(false),
        })
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Apply every pending migration.
    ///
    /// File names and duplicate versions are checked before the database is
    /// touched. The ledger table is created on the first call. Drift in an
    /// applied migration fails the run before any transaction begins.
    pub async fn migrate(&self) -> MigrateResult<MigrationReport> {
        let migrations = discover_migrations(&self.migrations_dir)?;

        if !self.schema_ready.load(Ordering::Acquire) {
            self.ledger
                .ensure_schema()
                .await
                .map_err(MigrateError::StoreUnavailable)?;
            self.schema_ready.store(true, Ordering::Release);
        }

        let pending = find_pending(&migrations, &self.ledger).await?;
        if pending.is_empty() {
            log::info!(
                "Database is up to date ({} migration(s) applied)",
                migrations.len()
            );
            return Ok(MigrationReport {
                discovered: migrations.len(),
                applied: Vec::new(),
            });
        }

        log::info!(
            "{} pending migration(s), starting at version {}",
            pending.len(),
            pending[0].version
        );
        let applied = MigrationRunner::new(&self.ledger).apply_all(pending).await?;

        Ok(MigrationReport {
            discovered: migrations.len(),
            applied,
        })
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
