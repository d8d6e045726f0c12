//! Fluent statement runner.
//!
//! A [`Runner`] accumulates table, column selection, predicate, ordering and
//! paging through `&mut self` calls in any order, then renders and executes
//! one statement per terminal call. The predicate is owned by the runner and
//! lent to every SELECT, UPDATE and DELETE it builds, so one set of conditions
//! scopes reads and writes alike.
//!
//! ```rust,ignore
//! let mut runner = Runner::new(&db);
//! runner.table_of::<User>().and_eq("active", true).order_by("id");
//! let users: Vec<User> = runner.all().await?;
//! let n = runner.count().await?;
//! runner.update_values([("active", false)]).await?;
//! ```

use crate::builder::{DeleteBuilder, InsertBuilder, Op, Predicate, SelectBuilder, UpdateBuilder};
use crate::client::{ExecResult, Executor};
use crate::config::RunnerConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::mapper;
use crate::monitor::{SqlEvent, SqlOutcome};
use crate::record::{Record, TableName, TagFamily};
use crate::row::Row;
use crate::statement::Statement;
use crate::value::{FromValue, ToValue, Value};
use std::future::Future;
use std::time::{Duration, Instant};

/// Bound `fut` by `timeout`, if any.
async fn bounded<T>(
    timeout: Option<Duration>,
    fut: impl Future<Output = RunnerResult<T>>,
) -> RunnerResult<T> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| RunnerError::Timeout(limit))?,
        None => fut.await,
    }
}

fn owned(columns: Vec<&'static str>) -> Vec<String> {
    columns.into_iter().map(str::to_string).collect()
}

/// Builds and runs statements against one executor.
pub struct Runner<'e, E: Executor> {
    executor: &'e E,
    config: RunnerConfig,
    family: TagFamily,
    select: SelectBuilder,
    predicate: Predicate,
    from_record: Option<fn(TagFamily) -> Vec<&'static str>>,
    raw: Option<Statement>,
    last: Option<Statement>,
}

impl<'e, E: Executor> Runner<'e, E> {
    pub fn new(executor: &'e E) -> Self {
        Self::with_config(executor, RunnerConfig::default())
    }

    pub fn with_config(executor: &'e E, config: RunnerConfig) -> Self {
        Self {
            executor,
            family: config.tag_family,
            config,
            select: SelectBuilder::default(),
            predicate: Predicate::new(),
            from_record: None,
            raw: None,
            last: None,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    // ==================== Configuration ====================

    pub fn table(&mut self, table: &str) -> &mut Self {
        self.select.table(table);
        self
    }

    /// Use the table a record is bound to with `#[orm(table = "..")]`.
    pub fn table_of<R: TableName>(&mut self) -> &mut Self {
        self.table(R::table_name())
    }

    pub fn table_name(&self) -> &str {
        self.select.table_name()
    }

    /// Switch the tag family used to resolve record columns.
    pub fn tag(&mut self, family: TagFamily) -> &mut Self {
        self.family = family;
        self
    }

    pub fn tag_family(&self) -> TagFamily {
        self.family
    }

    /// Choose the columns to read, replacing any earlier selection.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.columns(columns);
        self
    }

    /// Read `R`'s mapped columns when a multi-row read has no explicit selection.
    pub fn from_record<R: Record>(&mut self) -> &mut Self {
        self.from_record = Some(mapper::mapped_columns::<R>);
        self
    }

    pub fn order_by(&mut self, clause: &str) -> &mut Self {
        self.select.order_by(clause);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.select.limit(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.select.offset(offset);
        self
    }

    /// Replace builder rendering with `sql` for the next read, count or exists.
    ///
    /// The override is consumed by that call and never applies to writes.
    pub fn raw(&mut self, sql: &str, args: Vec<Value>) -> &mut Self {
        self.raw = Some(Statement::new(sql, args));
        self
    }

    /// The most recently executed statement.
    pub fn last_statement(&self) -> Option<&Statement> {
        self.last.as_ref()
    }

    // ==================== Predicate ====================

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn predicate_mut(&mut self) -> &mut Predicate {
        &mut self.predicate
    }

    pub fn and_where(&mut self, col: &str, op: Op, val: impl ToValue) -> &mut Self {
        self.predicate.and_where(col, op, val);
        self
    }

    pub fn or_where(&mut self, col: &str, op: Op, val: impl ToValue) -> &mut Self {
        self.predicate.or_where(col, op, val);
        self
    }

    pub fn and_eq(&mut self, col: &str, val: impl ToValue) -> &mut Self {
        self.predicate.and_eq(col, val);
        self
    }

    pub fn or_eq(&mut self, col: &str, val: impl ToValue) -> &mut Self {
        self.predicate.or_eq(col, val);
        self
    }

    pub fn and_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.predicate.and_in(col, values);
        self
    }

    pub fn or_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.predicate.or_in(col, values);
        self
    }

    pub fn and_not_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.predicate.and_not_in(col, values);
        self
    }

    pub fn or_not_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.predicate.or_not_in(col, values);
        self
    }

    pub fn and_like(&mut self, col: &str, pattern: impl ToValue) -> &mut Self {
        self.predicate.and_like(col, pattern);
        self
    }

    pub fn or_like(&mut self, col: &str, pattern: impl ToValue) -> &mut Self {
        self.predicate.or_like(col, pattern);
        self
    }

    pub fn and_null(&mut self, col: &str) -> &mut Self {
        self.predicate.and_null(col);
        self
    }

    pub fn and_not_null(&mut self, col: &str) -> &mut Self {
        self.predicate.and_not_null(col);
        self
    }

    pub fn and_raw(&mut self, fragment: &str, args: Vec<Value>) -> &mut Self {
        self.predicate.and_raw(fragment, args);
        self
    }

    pub fn or_raw(&mut self, fragment: &str, args: Vec<Value>) -> &mut Self {
        self.predicate.or_raw(fragment, args);
        self
    }

    pub fn and_group(&mut self, other: &Predicate) -> &mut Self {
        self.predicate.and_group(other);
        self
    }

    pub fn or_group(&mut self, other: &Predicate) -> &mut Self {
        self.predicate.or_group(other);
        self
    }

    // ==================== Execution ====================

    fn emit(&self, stmt: &Statement, started: Instant, outcome: SqlOutcome) {
        let event = SqlEvent::new(stmt.sql(), stmt.args(), started.elapsed(), outcome);
        self.config.sink.record(&event);
    }

    async fn run_query(&mut self, stmt: Statement) -> RunnerResult<Vec<Row>> {
        let executor = self.executor;
        let started = Instant::now();
        let result = bounded(
            self.config.query_timeout,
            executor.query(stmt.sql(), stmt.args()),
        )
        .await;
        if self.config.tracing_active() {
            let outcome = match &result {
                Ok(rows) => SqlOutcome::Rows(rows.len()),
                Err(e) => SqlOutcome::error(e.to_string()),
            };
            self.emit(&stmt, started, outcome);
        }
        self.last = Some(stmt);
        result
    }

    async fn run_row(&mut self, stmt: Statement) -> RunnerResult<Row> {
        let executor = self.executor;
        let started = Instant::now();
        let result = bounded(
            self.config.query_timeout,
            executor.query_row(stmt.sql(), stmt.args()),
        )
        .await;
        if self.config.tracing_active() {
            let outcome = match &result {
                Ok(_) => SqlOutcome::Rows(1),
                Err(e) if e.is_not_found() => SqlOutcome::Rows(0),
                Err(e) => SqlOutcome::error(e.to_string()),
            };
            self.emit(&stmt, started, outcome);
        }
        self.last = Some(stmt);
        result
    }

    async fn run_exec(&mut self, stmt: Statement) -> RunnerResult<ExecResult> {
        let executor = self.executor;
        let started = Instant::now();
        let result = bounded(
            self.config.query_timeout,
            executor.exec(stmt.sql(), stmt.args()),
        )
        .await;
        if self.config.tracing_active() {
            let outcome = match &result {
                Ok(res) => SqlOutcome::Affected(res.rows_affected),
                Err(e) => SqlOutcome::error(e.to_string()),
            };
            self.emit(&stmt, started, outcome);
        }
        self.last = Some(stmt);
        result
    }

    /// Render the current SELECT with `columns` swapped in.
    fn render_select(
        &self,
        columns: &[String],
        tweak: impl FnOnce(&mut SelectBuilder),
    ) -> RunnerResult<Statement> {
        if columns.is_empty() {
            return Err(RunnerError::usage(format!(
                "no columns to select from `{}`: call select() or read into a record with mapped `{}` columns",
                self.select.table_name(),
                self.family
            )));
        }
        let mut select = self.select.clone();
        select.columns(columns.iter().cloned());
        tweak(&mut select);
        select.build(&self.predicate)
    }

    /// Explicit selection, else `fallback`.
    fn selection_or(&self, fallback: impl FnOnce() -> Vec<&'static str>) -> Vec<String> {
        if self.select.selected().is_empty() {
            owned(fallback())
        } else {
            self.select.selected().to_vec()
        }
    }

    fn scan_into<R: Record>(&self, dest: &mut R, selected: &[String], row: Row) -> RunnerResult<()> {
        let targets = mapper::scan_targets(dest, self.family, &[]);
        let aligned = mapper::align_targets(targets, selected)?;
        mapper::scan_row(aligned, row)
    }

    // ==================== Reads ====================

    /// Read one row into a new `R`.
    pub async fn get<R: Record>(&mut self) -> RunnerResult<R> {
        let mut dest = R::default();
        self.get_into(&mut dest).await?;
        Ok(dest)
    }

    /// Read one row into `dest`.
    ///
    /// Renders with LIMIT 1 OFFSET 0. Without an explicit selection the
    /// destination's mapped columns are read; only selected columns are written
    /// into `dest`. Zero rows is [`RunnerError::NotFound`].
    pub async fn get_into<R: Record>(&mut self, dest: &mut R) -> RunnerResult<()> {
        let family = self.family;
        let (stmt, selected) = match self.raw.take() {
            Some(stmt) => (stmt, None),
            None => {
                let selected = self.selection_or(|| mapper::mapped_columns::<R>(family));
                let stmt = self.render_select(&selected, |s| {
                    s.limit(1).offset(0);
                })?;
                (stmt, Some(selected))
            }
        };

        let row = self.run_row(stmt).await?;
        let selected = match selected {
            Some(selected) => selected,
            None => row.columns().to_vec(),
        };
        self.scan_into(dest, &selected, row)
    }

    /// Read every row into a new `Vec<R>`.
    pub async fn all<R: Record>(&mut self) -> RunnerResult<Vec<R>> {
        let mut dest = Vec::new();
        self.all_into(&mut dest).await?;
        Ok(dest)
    }

    /// Append one `R` per row to `dest`.
    ///
    /// Without an explicit selection the columns registered with
    /// [`Runner::from_record`] are read, falling back to `R`'s own.
    pub async fn all_into<R: Record>(&mut self, dest: &mut Vec<R>) -> RunnerResult<()> {
        let family = self.family;
        let (stmt, selected) = match self.raw.take() {
            Some(stmt) => (stmt, None),
            None => {
                let from = self.from_record.unwrap_or(mapper::mapped_columns::<R>);
                let selected = self.selection_or(|| from(family));
                let stmt = self.render_select(&selected, |_| {})?;
                (stmt, Some(selected))
            }
        };

        let rows = self.run_query(stmt).await?;
        dest.reserve(rows.len());
        for row in rows {
            let columns = match &selected {
                Some(selected) => selected.clone(),
                None => row.columns().to_vec(),
            };
            let mut item = R::default();
            self.scan_into(&mut item, &columns, row)?;
            dest.push(item);
        }
        Ok(())
    }

    /// Read a single column of every row.
    pub async fn pluck<T: FromValue>(&mut self, column: &str) -> RunnerResult<Vec<T>> {
        let mut dest = Vec::new();
        self.pluck_into(column, &mut dest).await?;
        Ok(dest)
    }

    /// Append the first value of every row to `dest`, selecting only `column`.
    pub async fn pluck_into<T: FromValue>(
        &mut self,
        column: &str,
        dest: &mut Vec<T>,
    ) -> RunnerResult<()> {
        let stmt = match self.raw.take() {
            Some(stmt) => stmt,
            None => {
                if column.trim().is_empty() {
                    return Err(RunnerError::usage("pluck requires a column name"));
                }
                self.render_select(&[column.to_string()], |_| {})?
            }
        };

        let rows = self.run_query(stmt).await?;
        dest.reserve(rows.len());
        for row in rows {
            let value = row.into_values().into_iter().next().ok_or_else(|| {
                RunnerError::decode(column, "query returned rows without columns")
            })?;
            dest.push(T::from_value(value).map_err(|e| e.for_column(column))?);
        }
        Ok(())
    }

    /// Count matching rows. No rows counts as zero.
    pub async fn count(&mut self) -> RunnerResult<i64> {
        let stmt = match self.raw.take() {
            Some(stmt) => stmt,
            None => self.render_select(&["count(*)".to_string()], |_| {})?,
        };

        let rows = self.run_query(stmt).await?;
        match rows.first() {
            Some(row) => row.try_get::<Option<i64>>(0).map(|n| n.unwrap_or(0)),
            None => Ok(0),
        }
    }

    /// Whether any row matches. No rows is `false`.
    pub async fn exists(&mut self) -> RunnerResult<bool> {
        let stmt = match self.raw.take() {
            Some(stmt) => stmt,
            None => self.render_select(&["1".to_string()], |s| {
                s.limit(1);
            })?,
        };

        let rows = self.run_query(stmt).await?;
        Ok(rows
            .iter()
            .any(|row| matches!(row.try_get::<i64>(0), Ok(1))))
    }

    // ==================== Writes ====================

    /// Insert one row from explicit `(column, value)` pairs.
    pub async fn insert_values<I, K, V>(&mut self, pairs: I) -> RunnerResult<ExecResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToValue,
    {
        let mut builder = InsertBuilder::new(self.select.table_name());
        builder.values(pairs);
        let stmt = builder.build()?;
        self.run_exec(stmt).await
    }

    /// Insert one record.
    pub async fn insert<R: Record>(&mut self, record: &R) -> RunnerResult<ExecResult> {
        let mut builder = InsertBuilder::new(self.select.table_name());
        builder.record(record, self.family);
        let stmt = builder.build()?;
        self.run_exec(stmt).await
    }

    /// Insert every record with one multi-row statement.
    pub async fn insert_many<R: Record>(&mut self, records: &[R]) -> RunnerResult<ExecResult> {
        let mut builder = InsertBuilder::new(self.select.table_name());
        builder.records(records, self.family);
        let stmt = builder.build()?;
        self.run_exec(stmt).await
    }

    /// Insert `records` in consecutive chunks of at most `size`.
    ///
    /// Chunks run one after another; the first failing chunk ends the call
    /// with its error and later chunks are never attempted. Chunks that
    /// already succeeded stay written unless the executor is a transaction
    /// the caller rolls back.
    pub async fn insert_batch<R: Record>(
        &mut self,
        records: &[R],
        size: usize,
    ) -> RunnerResult<ExecResult> {
        if size == 0 {
            return Err(RunnerError::usage("insert_batch: batch size must be at least 1"));
        }

        let chunks = records.len().div_ceil(size);
        let mut total = ExecResult::default();
        for (index, chunk) in records.chunks(size).enumerate() {
            tracing::debug!(
                table = self.select.table_name(),
                chunk = index + 1,
                chunks,
                rows = chunk.len(),
                "inserting batch"
            );
            match self.insert_many(chunk).await {
                Ok(res) => total.merge(res),
                Err(e) => {
                    tracing::warn!(
                        table = self.select.table_name(),
                        chunk = index + 1,
                        chunks,
                        error = %e,
                        "batch insert stopped"
                    );
                    return Err(e);
                }
            }
        }
        Ok(total)
    }

    /// UPDATE the matching rows from explicit `(column, value)` pairs.
    pub async fn update_values<I, K, V>(&mut self, pairs: I) -> RunnerResult<ExecResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToValue,
    {
        let mut builder = UpdateBuilder::new(self.select.table_name());
        builder.values(pairs);
        let stmt = builder.build(&self.predicate)?;
        self.run_exec(stmt).await
    }

    /// UPDATE the matching rows with every mapped field of `record`.
    pub async fn update<R: Record>(&mut self, record: &R) -> RunnerResult<ExecResult> {
        let mut builder = UpdateBuilder::new(self.select.table_name());
        builder.record(record, self.family);
        let stmt = builder.build(&self.predicate)?;
        self.run_exec(stmt).await
    }

    /// UPDATE the matching rows with only `fields` of `record`.
    pub async fn update_fields<R: Record>(
        &mut self,
        record: &R,
        fields: &[&str],
    ) -> RunnerResult<ExecResult> {
        let mut builder = UpdateBuilder::new(self.select.table_name());
        builder.record_fields(record, self.family, fields)?;
        let stmt = builder.build(&self.predicate)?;
        self.run_exec(stmt).await
    }

    /// DELETE the matching rows.
    ///
    /// An empty predicate deletes every row of the table.
    pub async fn delete(&mut self) -> RunnerResult<ExecResult> {
        if self.predicate.is_empty() {
            tracing::warn!(
                table = self.select.table_name(),
                "DELETE without WHERE affects every row"
            );
        }
        let stmt = DeleteBuilder::new(self.select.table_name()).build(&self.predicate)?;
        self.run_exec(stmt).await
    }

    /// Execute arbitrary SQL with positional arguments.
    pub async fn exec(&mut self, sql: &str, args: Vec<Value>) -> RunnerResult<ExecResult> {
        self.run_exec(Statement::new(sql, args)).await
    }
}

#[cfg(all(test, feature = "derive"))]
mod tests;
