//! tm-engine - Migration engine for Tidemark
//!
//! Applies versioned SQL migrations exactly once. The ledger table records
//! every applied version with the SHA-256 of its file; a changed file is
//! reported as drift instead of being re-applied or ignored.
//!
//! ```no_run
//! # async fn example(db: std::sync::Arc<dyn tm_db::Database>) -> tm_engine::MigrateResult<()> {
//! let service = tm_engine::MigrationService::initialize(db, "migrations")?;
//! let report = service.migrate().await?;
//! println!("applied {:?}", report.applied);
//! # Ok(())
//! # }
//! ```

pub mod drift;
pub mod error;
pub mod ledger;
pub mod runner;
pub mod service;
pub mod status;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use drift::find_pending;
pub use error::{LedgerError, LedgerResult, MigrateError, MigrateResult};
pub use ledger::{AppliedMigration, LedgerEntry, LedgerStore};
pub use runner::MigrationRunner;
pub use service::{MigrationReport, MigrationService};
pub use status::{migration_status, MigrationState, MigrationStatus};
