//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use crate::value::{Row, SqlValue};
use async_trait::async_trait;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    /// Execute batch SQL synchronously
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Execute a parameterized statement synchronously
    fn execute_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, duckdb::params_from_iter(params.iter().map(to_duckdb)))
            .map_err(DbError::from)
    }

    /// Run a parameterized query synchronously
    fn query_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(duckdb::params_from_iter(params.iter().map(to_duckdb)))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let width = row.as_ref().column_count();
            let mut cells = Vec::with_capacity(width);
            for idx in 0..width {
                let value: Value = row.get(idx)?;
                cells.push(from_duckdb(value));
            }
            out.push(cells);
        }
        Ok(out)
    }

    /// Run a transaction-control statement synchronously
    fn transaction_sync(&self, operation: &str, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql)
            .map_err(|e| DbError::transaction(operation, e))
    }
}

/// Convert a bound parameter to the DuckDB value type
fn to_duckdb(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::BigInt(*v),
        SqlValue::Real(v) => Value::Double(*v),
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Timestamp(micros) => Value::Timestamp(TimeUnit::Microsecond, *micros),
    }
}

/// Convert a DuckDB result cell to a driver-neutral value
fn from_duckdb(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Integer(i64::from(b)),
        Value::TinyInt(v) => SqlValue::Integer(i64::from(v)),
        Value::SmallInt(v) => SqlValue::Integer(i64::from(v)),
        Value::Int(v) => SqlValue::Integer(i64::from(v)),
        Value::BigInt(v) => SqlValue::Integer(v),
        Value::UTinyInt(v) => SqlValue::Integer(i64::from(v)),
        Value::USmallInt(v) => SqlValue::Integer(i64::from(v)),
        Value::UInt(v) => SqlValue::Integer(i64::from(v)),
        Value::Float(v) => SqlValue::Real(f64::from(v)),
        Value::Double(v) => SqlValue::Real(v),
        Value::Text(s) => SqlValue::Text(s),
        Value::Timestamp(unit, v) => SqlValue::Timestamp(to_micros(unit, v)),
        other => SqlValue::Text(format!("{other:?}")),
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.execute_sync(sql, params)
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        self.query_sync(sql, params)
    }

    async fn begin_transaction(&self) -> DbResult<()> {
        self.transaction_sync("BEGIN", "BEGIN TRANSACTION")
    }

    async fn commit(&self) -> DbResult<()> {
        self.transaction_sync("COMMIT", "COMMIT")
    }

    async fn rollback(&self) -> DbResult<()> {
        self.transaction_sync("ROLLBACK", "ROLLBACK")
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
