//! Transactional migration runner.
//!
//! Each pending migration runs in its own transaction: BEGIN, execute the SQL
//! body, insert the ledger row, COMMIT. The schema change and its ledger row
//! are committed or rolled back together. Migrations run strictly one after
//! another; the first failure stops the run.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{LedgerEntry, LedgerStore};
use tm_core::Migration;

/// Applies a pending set through a [`LedgerStore`]'s connection.
pub struct MigrationRunner<'a> {
    ledger: &'a LedgerStore,
}

impl<'a> MigrationRunner<'a> {
    pub fn new(ledger: &'a LedgerStore) -> Self {
        Self { ledger }
    }

    /// Apply `pending` in order and return the versions applied.
    ///
    /// `pending` must be ascending by version. Before each migration the ledger
    /// is checked again: a version that is already recorded means the ledger
    /// has a gap below it, and the run stops without executing anything for
    /// that version.
    pub async fn apply_all(&self, pending: &[Migration]) -> MigrateResult<Vec<u32>> {
        let Some(first_pending) = pending.first().map(|m| m.version) else {
            return Ok(Vec::new());
        };

        let mut applied = Vec::with_capacity(pending.len());
        for migration in pending {
            self.ensure_unrecorded(migration, first_pending).await?;
            self.apply_one(migration).await?;
            applied.push(migration.version);
        }
        Ok(applied)
    }

    async fn ensure_unrecorded(
        &self,
        migration: &Migration,
        first_pending: u32,
    ) -> MigrateResult<()> {
        let recorded = self
            .ledger
            .lookup(migration.version)
            .await
            .map_err(MigrateError::StoreUnavailable)?;
        if recorded.is_some() {
            return Err(MigrateError::LedgerGap {
                version: migration.version,
                first_pending,
            });
        }
        Ok(())
    }

    async fn apply_one(&self, migration: &Migration) -> MigrateResult<()> {
        let db = self.ledger.database();
        let version = migration.version;
        log::debug!(
            "Applying migration {migration} from {}",
            migration.source.display()
        );

        db.begin_transaction()
            .await
            .map_err(|source| MigrateError::BeginFailed { version, source })?;

        if let Err(source) = db.execute_batch(migration.sql()).await {
            return Err(self
                .rollback_after(version, MigrateError::ApplyFailed { version, source })
                .await);
        }

        if let Err(source) = self.ledger.record(&LedgerEntry::from(migration)).await {
            return Err(self
                .rollback_after(version, MigrateError::LedgerWriteFailed { version, source })
                .await);
        }

        if let Err(source) = db.commit().await {
            // Durability is unknown after a failed COMMIT. Release whatever the
            // driver still holds, once, and surface both errors together.
            let rollback = db.rollback().await.err();
            return Err(MigrateError::CommitFailed {
                version,
                source,
                rollback,
            });
        }

        log::info!("Applied migration {migration}");
        Ok(())
    }

    /// Roll back once after `cause`. A failing rollback is fatal and is never
    /// retried.
    async fn rollback_after(&self, version: u32, cause: MigrateError) -> MigrateError {
        log::debug!("Rolling back migration {version}: {cause}");
        match self.ledger.database().rollback().await {
            Ok(()) => cause,
            Err(rollback) => MigrateError::RollbackFailed {
                version,
                rollback,
                cause: Box::new(cause),
            },
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
