//! Execution capability the runner drives.

use crate::error::{RunnerError, RunnerResult};
use crate::row::Row;
use crate::value::Value;
use std::future::Future;

/// Outcome of a non-query statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
    /// Rowid of the last inserted row, when the backend reports one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    /// Fold `other` into `self`: affected rows are summed, the latest insert id wins.
    pub fn merge(&mut self, other: ExecResult) {
        self.rows_affected += other.rows_affected;
        if other.last_insert_id.is_some() {
            self.last_insert_id = other.last_insert_id;
        }
    }
}

/// A trait that unifies connections, pools and transactions.
///
/// Arguments bind positionally to the `?` placeholders of `sql`. Errors are
/// returned as the executor produced them; the runner never rewrites them.
pub trait Executor: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = RunnerResult<Vec<Row>>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`RunnerError::NotFound`]
    /// - 1 or more rows: returns the first row (does **not** error)
    fn query_row(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = RunnerResult<Row>> + Send {
        async move {
            self.query(sql, args)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| RunnerError::not_found("Expected 1 row, got 0"))
        }
    }

    /// Execute a statement and report the affected rows.
    fn exec(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = RunnerResult<ExecResult>> + Send;
}

impl<E: Executor> Executor for &E {
    fn query(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = RunnerResult<Vec<Row>>> + Send {
        (**self).query(sql, args)
    }

    fn query_row(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = RunnerResult<Row>> + Send {
        (**self).query_row(sql, args)
    }

    fn exec(
        &self,
        sql: &str,
        args: &[Value],
    ) -> impl Future<Output = RunnerResult<ExecResult>> + Send {
        (**self).exec(sql, args)
    }
}
