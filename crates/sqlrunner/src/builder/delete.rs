use super::where_builder::Predicate;
use crate::error::{RunnerError, RunnerResult};
use crate::statement::Statement;

/// DELETE builder.
///
/// An empty predicate renders an unconditional `DELETE FROM t`; guarding
/// against full-table deletes is up to the caller.
#[derive(Debug, Clone, Default)]
pub struct DeleteBuilder {
    table: String,
}

impl DeleteBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
        }
    }

    /// Render `DELETE FROM t [WHERE ..]`.
    pub fn build(&self, predicate: &Predicate) -> RunnerResult<Statement> {
        if self.table.is_empty() {
            return Err(RunnerError::build("DeleteBuilder: table name is required"));
        }
        let mut sql = format!("DELETE FROM {}", self.table);
        let mut args = Vec::new();
        predicate.write_where(&mut sql, &mut args)?;
        Ok(Statement::new(sql, args))
    }
}
