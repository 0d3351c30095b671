//! Database trait definition

use crate::error::DbResult;
use crate::value::{Row, SqlValue};
use async_trait::async_trait;

/// Database abstraction trait for Tidemark
///
/// Implementations must be Send + Sync for async operation. Transaction
/// control is connection-scoped: statements issued between
/// [`begin_transaction`](Database::begin_transaction) and
/// [`commit`](Database::commit) / [`rollback`](Database::rollback) belong to
/// that transaction.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute one or more SQL statements with no parameters
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single parameterized statement, returns affected rows
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize>;

    /// Run a parameterized query and collect every row
    async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Row>>;

    /// Open a transaction on the connection
    async fn begin_transaction(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
