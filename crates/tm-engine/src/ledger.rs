//! Ledger store: the persisted record of applied migrations.
//!
//! One row per applied version. Rows are only ever inserted, inside the same
//! transaction as the migration they describe.

use crate::error::{LedgerError, LedgerResult, MigrateError, MigrateResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tm_core::config::is_valid_table_name;
use tm_core::Migration;
use tm_db::{Database, DbError, Row, SqlValue};

/// A ledger row to insert for a migration being applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub version: u32,
    pub name: String,
    pub content_hash: String,
}

impl From<&Migration> for LedgerEntry {
    fn from(m: &Migration) -> Self {
        Self {
            version: m.version,
            name: m.name.clone(),
            content_hash: m.content_hash.clone(),
        }
    }
}

/// A ledger row as read back, including the server-assigned timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: u32,
    pub name: String,
    pub content_hash: String,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Reads and writes the ledger table through a [`Database`].
#[derive(Clone)]
pub struct LedgerStore {
    db: Arc<dyn Database>,
    table: String,
}

impl LedgerStore {
    /// Create a store for `table`, which must be a plain (optionally
    /// schema-qualified) identifier since it is spliced into SQL.
    pub fn new(db: Arc<dyn Database>, table: &str) -> MigrateResult<Self> {
        if !is_valid_table_name(table) {
            return Err(MigrateError::InvalidLedgerTable {
                table: table.to_string(),
            });
        }
        Ok(Self {
            db,
            table: table.to_string(),
        })
    }

    /// The connection the ledger reads and writes through
    pub fn database(&self) -> &dyn Database {
        self.db.as_ref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the ledger table (and its schema, if qualified) when absent.
    pub async fn ensure_schema(&self) -> LedgerResult<()> {
        if let Some((schema, _)) = self.table.split_once('.') {
            self.db
                .execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
                .await
                .map_err(LedgerError::StoreUnavailable)?;
        }

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                 version  INTEGER PRIMARY KEY,
                 name     TEXT NOT NULL,
                 hash_sum VARCHAR(64) NOT NULL,
                 date     TIMESTAMP DEFAULT CURRENT_TIMESTAMP
             )",
            self.table
        );
        self.db
            .execute_batch(&ddl)
            .await
            .map_err(LedgerError::StoreUnavailable)?;
        log::debug!("Ledger table {} is ready", self.table);
        Ok(())
    }

    /// Recorded content hash for `version`, or `None` if it was never applied.
    pub async fn lookup(&self, version: u32) -> LedgerResult<Option<String>> {
        let sql = format!("SELECT hash_sum FROM {} WHERE version = ?", self.table);
        let rows = self
            .db
            .query(&sql, &[SqlValue::from(version)])
            .await
            .map_err(LedgerError::StoreUnavailable)?;

        match rows.first().and_then(|row| row.first()) {
            None => Ok(None),
            Some(SqlValue::Text(hash)) => Ok(Some(hash.clone())),
            Some(other) => Err(LedgerError::MalformedRow(format!(
                "hash_sum for version {version} is {other:?}"
            ))),
        }
    }

    /// Insert a ledger row. Must run inside the caller's open transaction.
    pub async fn record(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        let sql = format!(
            "INSERT INTO {} (version, name, hash_sum) VALUES (?, ?, ?)",
            self.table
        );
        let params = [
            SqlValue::from(entry.version),
            SqlValue::from(entry.name.as_str()),
            SqlValue::from(entry.content_hash.as_str()),
        ];
        match self.db.execute(&sql, &params).await {
            Ok(_) => Ok(()),
            Err(DbError::ConstraintViolation(_)) => Err(LedgerError::DuplicateVersion(entry.version)),
            Err(e) => Err(LedgerError::StoreUnavailable(e)),
        }
    }

    /// Every ledger row, ascending by version.
    pub async fn entries(&self) -> LedgerResult<Vec<AppliedMigration>> {
        let sql = format!(
            "SELECT version, name, hash_sum, date FROM {} ORDER BY version",
            self.table
        );
        let rows = self
            .db
            .query(&sql, &[])
            .await
            .map_err(LedgerError::StoreUnavailable)?;
        rows.iter().map(applied_from_row).collect()
    }
}

fn applied_from_row(row: &Row) -> LedgerResult<AppliedMigration> {
    let malformed = || LedgerError::MalformedRow(format!("{row:?}"));

    let version = row
        .first()
        .and_then(SqlValue::as_i64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(malformed)?;
    let name = row.get(1).and_then(SqlValue::as_str).ok_or_else(malformed)?;
    let content_hash = row.get(2).and_then(SqlValue::as_str).ok_or_else(malformed)?;
    let applied_at = match row.get(3) {
        Some(SqlValue::Timestamp(micros)) => DateTime::from_timestamp_micros(*micros),
        _ => None,
    };

    Ok(AppliedMigration {
        version,
        name: name.to_string(),
        content_hash: content_hash.to_string(),
        applied_at,
    })
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
