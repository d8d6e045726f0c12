use super::build_message;
use crate::error::{RunnerError, RunnerResult};
use crate::mapper;
use crate::record::{Record, TagFamily};
use crate::statement::Statement;
use crate::value::{ToValue, Value};

/// INSERT builder producing one multi-row `VALUES` statement.
#[derive(Debug, Clone, Default)]
pub struct InsertBuilder {
    /// Table name
    table: String,
    /// Column names, fixed by the first row
    columns: Vec<String>,
    /// One value list per VALUES row
    rows: Vec<Vec<Value>>,
    /// Build error (validated at build time)
    build_error: Option<String>,
}

impl InsertBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    fn push_row(&mut self, columns: Vec<String>, values: Vec<Value>) {
        if self.rows.is_empty() {
            self.columns = columns;
        } else if self.columns != columns {
            self.build_error = Some(format!(
                "InsertBuilder: row {} has columns ({}) but the statement has ({})",
                self.rows.len(),
                columns.join(", "),
                self.columns.join(", ")
            ));
            return;
        }
        self.rows.push(values);
    }

    /// Add one row from explicit `(column, value)` pairs.
    pub fn values<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToValue,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_value()))
            .unzip();
        self.push_row(columns, values);
        self
    }

    /// Add one row from a record's mapped fields.
    ///
    /// A record that cannot be written (a `None` optional embed) is reported
    /// by [`InsertBuilder::build`].
    pub fn record<R: Record>(&mut self, record: &R, family: TagFamily) -> &mut Self {
        match mapper::column_values(record, family, &[]) {
            Ok(pairs) => {
                let (columns, values): (Vec<String>, Vec<Value>) = pairs
                    .into_iter()
                    .map(|(c, v)| (c.to_string(), v))
                    .unzip();
                self.push_row(columns, values);
            }
            Err(e) => {
                if self.build_error.is_none() {
                    self.build_error = Some(build_message(e));
                }
            }
        }
        self
    }

    /// Add one row per record; every record must map the same columns.
    pub fn records<R: Record>(&mut self, records: &[R], family: TagFamily) -> &mut Self {
        for record in records {
            self.record(record, family);
        }
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Render `INSERT INTO t (cols) VALUES (?, ..), (?, ..)`.
    pub fn build(&self) -> RunnerResult<Statement> {
        if let Some(err) = &self.build_error {
            return Err(RunnerError::build(err.clone()));
        }
        if self.table.is_empty() {
            return Err(RunnerError::build("InsertBuilder: table name is required"));
        }
        if self.rows.is_empty() {
            return Err(RunnerError::build("InsertBuilder: no rows to insert"));
        }
        if self.columns.is_empty() {
            return Err(RunnerError::build("InsertBuilder: no mapped columns to insert"));
        }

        let row_sql = format!("({})", vec!["?"; self.columns.len()].join(", "));
        let values_sql = vec![row_sql.as_str(); self.rows.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            values_sql
        );
        let args = self.rows.iter().flatten().cloned().collect();
        Ok(Statement::new(sql, args))
    }
}
