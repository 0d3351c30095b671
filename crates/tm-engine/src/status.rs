//! Read-only comparison of discovered migrations against the ledger.

use crate::ledger::AppliedMigration;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tm_core::MigrationSet;

/// State of one version as seen from the files and the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationState {
    /// Recorded with a matching hash
    Applied { applied_at: Option<DateTime<Utc>> },
    /// Not recorded yet
    Pending,
    /// Recorded, but the file no longer hashes to the recorded value
    Drifted { recorded: String },
    /// Recorded, but no file has this version any more
    Missing,
}

/// One line of a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: u32,
    pub name: String,
    pub state: MigrationState,
}

/// Merge files and ledger rows into one report, ascending by version.
pub fn migration_status(
    migrations: &MigrationSet,
    applied: &[AppliedMigration],
) -> Vec<MigrationStatus> {
    let mut recorded: BTreeMap<u32, &AppliedMigration> =
        applied.iter().map(|a| (a.version, a)).collect();

    let mut report: Vec<MigrationStatus> = migrations
        .iter()
        .map(|m| {
            let state = match recorded.remove(&m.version) {
                None => MigrationState::Pending,
                Some(row) if row.content_hash != m.content_hash => MigrationState::Drifted {
                    recorded: row.content_hash.clone(),
                },
                Some(row) => MigrationState::Applied {
                    applied_at: row.applied_at,
                },
            };
            MigrationStatus {
                version: m.version,
                name: m.name.clone(),
                state,
            }
        })
        .collect();

    report.extend(recorded.into_values().map(|row| MigrationStatus {
        version: row.version,
        name: row.name.clone(),
        state: MigrationState::Missing,
    }));
    report.sort_by_key(|s| s.version);
    report
}
