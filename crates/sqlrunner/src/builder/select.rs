use super::where_builder::Predicate;
use crate::error::{RunnerError, RunnerResult};
use crate::statement::Statement;

/// Structured SELECT query builder.
///
/// The WHERE clause is not owned here: [`SelectBuilder::build`] borrows the
/// predicate, so the same conditions can drive UPDATE and DELETE too.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    /// Table expression
    table: String,
    /// SELECT columns (empty renders `*`)
    columns: Vec<String>,
    /// ORDER BY clauses
    order_clauses: Vec<String>,
    /// LIMIT
    limit: Option<u64>,
    /// OFFSET (only rendered together with LIMIT)
    offset: Option<u64>,
}

impl SelectBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    pub fn table(&mut self, table: &str) -> &mut Self {
        self.table = table.to_string();
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Replace the selected columns.
    pub fn columns<I, S>(&mut self, cols: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Currently selected columns (empty means `*`).
    pub fn selected(&self) -> &[String] {
        &self.columns
    }

    pub fn order_by(&mut self, clause: &str) -> &mut Self {
        self.order_clauses.push(clause.to_string());
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Render `SELECT .. FROM .. [WHERE ..] [ORDER BY ..] [LIMIT n [OFFSET m]]`.
    pub fn build(&self, predicate: &Predicate) -> RunnerResult<Statement> {
        if self.table.is_empty() {
            return Err(RunnerError::build("SelectBuilder: table name is required"));
        }

        let cols = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", cols, self.table);
        let mut args = Vec::new();
        predicate.write_where(&mut sql, &mut args)?;

        if !self.order_clauses.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clauses.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {}", offset));
            }
        }

        Ok(Statement::new(sql, args))
    }
}
