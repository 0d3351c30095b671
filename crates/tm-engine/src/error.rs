//! Error types for the migration engine.

use thiserror::Error;
use tm_core::CoreError;
use tm_db::DbError;

/// Ledger store errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger already has a row for this version (L001).
    #[error("[L001] Ledger already records version {0}")]
    DuplicateVersion(u32),

    /// The ledger table could not be read or written (L002).
    #[error("[L002] Ledger store unavailable: {0}")]
    StoreUnavailable(#[source] DbError),

    /// A ledger row did not have the expected shape (L003).
    #[error("[L003] Malformed ledger row: {0}")]
    MalformedRow(String),
}

/// Result type alias for [`LedgerError`].
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Migration run errors.
///
/// Every variant aborts the whole run. Variants carrying a `version` identify
/// the migration that failed.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// A file in the migrations directory is not named `V<version>__<name>.sql` (MG001).
    #[error("[MG001] Migration file '{file}' has an invalid name: {reason}")]
    InvalidNameFormat { file: String, reason: String },

    /// Two migration files share a version (MG002).
    #[error("[MG002] Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: u32,
        first: String,
        second: String,
    },

    /// An applied migration's file content changed since it was applied (MG003).
    #[error("[MG003] Checksum mismatch for migration {version}: ledger has {recorded}, file has {current}. Applied migrations must not be edited")]
    ChecksumMismatch {
        version: u32,
        recorded: String,
        current: String,
    },

    /// The migration SQL failed; its transaction was rolled back (MG004).
    #[error("[MG004] Can not apply migration {version}: {source}")]
    ApplyFailed {
        version: u32,
        #[source]
        source: DbError,
    },

    /// The ledger row could not be written; the transaction was rolled back (MG005).
    #[error("[MG005] Can not update ledger for migration {version}: {source}")]
    LedgerWriteFailed {
        version: u32,
        #[source]
        source: LedgerError,
    },

    /// COMMIT failed; whether the migration is durable is unknown (MG006).
    ///
    /// `rollback` holds the error of the single cleanup rollback, if it failed.
    #[error(
        "[MG006] Can not commit migration {version}: {source}{}. Database state must be checked manually",
        rollback_note(.rollback)
    )]
    CommitFailed {
        version: u32,
        #[source]
        source: DbError,
        rollback: Option<DbError>,
    },

    /// The ledger could not be created or queried (MG007).
    #[error("[MG007] {0}")]
    StoreUnavailable(#[source] LedgerError),

    /// ROLLBACK failed after another failure; database state is unknown (MG008).
    #[error("[MG008] Can not roll back migration {version} after error ({cause}): {rollback}")]
    RollbackFailed {
        version: u32,
        #[source]
        rollback: DbError,
        cause: Box<MigrateError>,
    },

    /// A version after the first pending one is already in the ledger (MG009).
    #[error("[MG009] Migration {version} is recorded in the ledger but earlier migration {first_pending} is not. Versions must be applied contiguously")]
    LedgerGap { version: u32, first_pending: u32 },

    /// BEGIN failed before the migration ran (MG010).
    #[error("[MG010] Can not start transaction for migration {version}: {source}")]
    BeginFailed {
        version: u32,
        #[source]
        source: DbError,
    },

    /// The migrations directory does not exist (MG011).
    #[error("[MG011] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// A migration file or the directory could not be read (MG012).
    #[error("[MG012] Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The configured ledger table name is not a plain identifier (MG013).
    #[error("[MG013] Invalid ledger table name '{table}'")]
    InvalidLedgerTable { table: String },

    /// Any other core error.
    #[error(transparent)]
    Core(CoreError),
}

fn rollback_note(rollback: &Option<DbError>) -> String {
    rollback
        .as_ref()
        .map(|e| format!(" (rollback also failed: {e})"))
        .unwrap_or_default()
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl MigrateError {
    /// Version of the migration this error is about, if any.
    pub fn version(&self) -> Option<u32> {
        match self {
            MigrateError::DuplicateVersion { version, .. }
            | MigrateError::ChecksumMismatch { version, .. }
            | MigrateError::ApplyFailed { version, .. }
            | MigrateError::LedgerWriteFailed { version, .. }
            | MigrateError::CommitFailed { version, .. }
            | MigrateError::RollbackFailed { version, .. }
            | MigrateError::LedgerGap { version, .. }
            | MigrateError::BeginFailed { version, .. } => Some(*version),
            _ => None,
        }
    }
}

impl From<CoreError> for MigrateError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidNameFormat { file, reason } => {
                MigrateError::InvalidNameFormat { file, reason }
            }
            CoreError::DuplicateVersion {
                version,
                first,
                second,
            } => MigrateError::DuplicateVersion {
                version,
                first,
                second,
            },
            CoreError::MigrationsDirNotFound { path } => {
                MigrateError::MigrationsDirNotFound { path }
            }
            CoreError::IoWithPath { path, source } => MigrateError::Io { path, source },
            other => MigrateError::Core(other),
        }
    }
}
