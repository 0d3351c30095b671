//! Drift detection and pending-set selection.
//!
//! Walks the migration set in ascending order against the ledger. Applied
//! migrations must still hash to what the ledger recorded; the first version
//! the ledger does not know starts the pending set, and everything after it is
//! pending too.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::LedgerStore;
use tm_core::{Migration, MigrationSet};

/// Return the pending tail of `migrations`, failing on the first drifted one.
///
/// Returns an empty slice when every migration is already applied.
pub async fn find_pending<'m>(
    migrations: &'m MigrationSet,
    ledger: &LedgerStore,
) -> MigrateResult<&'m [Migration]> {
    for migration in migrations {
        let recorded = ledger
            .lookup(migration.version)
            .await
            .map_err(MigrateError::StoreUnavailable)?;

        match recorded {
            None => {
                log::debug!("First pending migration is {migration}");
                return Ok(migrations.from_version(migration.version));
            }
            Some(hash) if hash != migration.content_hash => {
                return Err(MigrateError::ChecksumMismatch {
                    version: migration.version,
                    recorded: hash,
                    current: migration.content_hash.clone(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(&[])
}

#[cfg(test)]
#[path = "drift_test.rs"]
mod tests;
