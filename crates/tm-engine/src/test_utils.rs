//! Shared test utilities for tm-engine
//!
//! [`RecordingDatabase`] wraps an in-memory DuckDB connection, logs every call
//! the engine makes, and can be told to fail specific operations.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tm_db::{Database, DbError, DbResult, DuckDbBackend, Row, SqlValue};

/// A database call as seen by [`RecordingDatabase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ExecuteBatch(String),
    Execute(String),
    Query(String),
    Begin,
    Commit,
    Rollback,
}

/// An operation [`RecordingDatabase`] should fail instead of forwarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Begin,
    Commit,
    Rollback,
    /// `execute_batch` whose SQL contains the text
    BatchContaining(String),
    /// `execute` whose SQL contains the text
    ExecuteContaining(String),
    /// `query` whose SQL contains the text
    QueryContaining(String),
}

/// In-memory DuckDB with a call log and fault injection.
pub struct RecordingDatabase {
    inner: DuckDbBackend,
    calls: Mutex<Vec<Call>>,
    faults: Mutex<Vec<Fault>>,
}

impl RecordingDatabase {
    pub fn new() -> Self {
        Self {
            inner: DuckDbBackend::in_memory().unwrap(),
            calls: Mutex::new(Vec::new()),
            faults: Mutex::new(Vec::new()),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Fail every matching call from now on
    pub fn fail_on(&self, fault: Fault) {
        self.faults.lock().unwrap().push(fault);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Bodies passed to `execute_batch`, in call order
    pub fn batches(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::ExecuteBatch(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    /// Number of BEGIN calls
    pub fn transactions_started(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Begin).count()
    }

    /// Query the underlying database directly, bypassing the log and faults
    pub async fn raw_query(&self, sql: &str) -> Vec<Row> {
        self.inner.query(sql, &[]).await.unwrap()
    }

    /// Whether a table with this name exists
    pub async fn table_exists(&self, name: &str) -> bool {
        let rows = self
            .inner
            .query(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
                &[SqlValue::from(name)],
            )
            .await
            .unwrap();
        rows[0][0] != SqlValue::Integer(0)
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn injected(&self, matches: impl Fn(&Fault) -> bool) -> DbResult<()> {
        if self.faults.lock().unwrap().iter().any(matches) {
            Err(DbError::ExecutionError("injected fault".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for RecordingDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for RecordingDatabase {
    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.log(Call::ExecuteBatch(sql.to_string()));
        self.injected(|f| matches!(f, Fault::BatchContaining(s) if sql.contains(s.as_str())))?;
        self.inner.execute_batch(sql).await
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.log(Call::Execute(sql.to_string()));
        self.injected(|f| matches!(f, Fault::ExecuteContaining(s) if sql.contains(s.as_str())))?;
        self.inner.execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>> {
        self.log(Call::Query(sql.to_string()));
        self.injected(|f| matches!(f, Fault::QueryContaining(s) if sql.contains(s.as_str())))?;
        self.inner.query(sql, params).await
    }

    async fn begin_transaction(&self) -> DbResult<()> {
        self.log(Call::Begin);
        self.injected(|f| *f == Fault::Begin)
            .map_err(|e| DbError::transaction("BEGIN", e))?;
        self.inner.begin_transaction().await
    }

    async fn commit(&self) -> DbResult<()> {
        self.log(Call::Commit);
        self.injected(|f| *f == Fault::Commit)
            .map_err(|e| DbError::transaction("COMMIT", e))?;
        self.inner.commit().await
    }

    async fn rollback(&self) -> DbResult<()> {
        self.log(Call::Rollback);
        self.injected(|f| *f == Fault::Rollback)
            .map_err(|e| DbError::transaction("ROLLBACK", e))?;
        self.inner.rollback().await
    }

    fn db_type(&self) -> &'static str {
        "duckdb-recording"
    }
}

/// Write a migration file into `dir`
pub fn write_migration(dir: &Path, file_name: &str, sql: &str) {
    std::fs::write(dir.join(file_name), sql).unwrap();
}
