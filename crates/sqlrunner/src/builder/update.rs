use super::build_message;
use super::where_builder::Predicate;
use crate::error::{RunnerError, RunnerResult};
use crate::mapper;
use crate::record::{Record, TagFamily};
use crate::statement::Statement;
use crate::value::{ToValue, Value};

/// UPDATE builder.
///
/// SET arguments always precede WHERE arguments in the rendered statement.
#[derive(Debug, Clone, Default)]
pub struct UpdateBuilder {
    /// Table name
    table: String,
    /// SET clauses (column, value)
    set_fields: Vec<(String, Value)>,
    /// Build error (validated at build time)
    build_error: Option<String>,
}

impl UpdateBuilder {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    /// Set a column.
    pub fn set(&mut self, column: &str, value: impl ToValue) -> &mut Self {
        self.set_fields.push((column.to_string(), value.to_value()));
        self
    }

    /// Set every `(column, value)` pair, in iteration order.
    pub fn values<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToValue,
    {
        self.set_fields
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.to_value())));
        self
    }

    /// Set every mapped field of `record`.
    pub fn record<R: Record>(&mut self, record: &R, family: TagFamily) -> &mut Self {
        match mapper::column_values(record, family, &[]) {
            Ok(pairs) => self
                .set_fields
                .extend(pairs.into_iter().map(|(c, v)| (c.to_string(), v))),
            Err(e) => self.build_error = Some(build_message(e)),
        }
        self
    }

    /// Set only the listed fields of `record`.
    ///
    /// Every listed field must be a mapped column of the record. An empty list
    /// sets every mapped field.
    pub fn record_fields<R: Record>(
        &mut self,
        record: &R,
        family: TagFamily,
        fields: &[&str],
    ) -> RunnerResult<&mut Self> {
        let mapped = mapper::mapped_columns::<R>(family);
        if let Some(missing) = fields.iter().find(|f| !mapped.iter().any(|m| *m == **f)) {
            return Err(RunnerError::usage(format!(
                "cannot update `{missing}`: not a mapped `{family}` column of the record"
            )));
        }
        let allow: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        self.set_fields.extend(
            mapper::column_values(record, family, &allow)?
                .into_iter()
                .map(|(c, v)| (c.to_string(), v)),
        );
        Ok(self)
    }

    /// Render `UPDATE t SET a = ?, .. [WHERE ..]`.
    pub fn build(&self, predicate: &Predicate) -> RunnerResult<Statement> {
        if let Some(err) = &self.build_error {
            return Err(RunnerError::build(err.clone()));
        }
        if self.table.is_empty() {
            return Err(RunnerError::build("UpdateBuilder: table name is required"));
        }
        if self.set_fields.is_empty() {
            return Err(RunnerError::build(
                "UpdateBuilder: SET clause cannot be empty",
            ));
        }

        let set_parts: Vec<String> = self
            .set_fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut sql = format!("UPDATE {} SET {}", self.table, set_parts.join(", "));
        let mut args: Vec<Value> = self.set_fields.iter().map(|(_, v)| v.clone()).collect();
        predicate.write_where(&mut sql, &mut args)?;
        Ok(Statement::new(sql, args))
    }
}
