//! Result rows returned by an [`Executor`](crate::Executor).

use crate::error::{RunnerError, RunnerResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// One result row: positional values plus the column names of the result set.
///
/// Column names are shared between all rows of one result.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row from shared column names and its values.
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Create a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Result column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Decode the value at `idx`.
    pub fn try_get<T: FromValue>(&self, idx: usize) -> RunnerResult<T> {
        let column = self
            .columns
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("#{idx}"));
        let value = self.values.get(idx).cloned().ok_or_else(|| {
            RunnerError::decode(&column, format!("row has only {} columns", self.len()))
        })?;
        T::from_value(value).map_err(|e| e.for_column(&column))
    }

    /// Decode the value of the named column.
    pub fn try_get_named<T: FromValue>(&self, column: &str) -> RunnerResult<T> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| RunnerError::decode(column, "no such column in result"))?;
        self.try_get(idx)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_by_index_and_name() {
        let row = Row::from_pairs([("id", Value::Int(3)), ("name", Value::from("ann"))]);
        assert_eq!(row.try_get::<i64>(0).unwrap(), 3);
        assert_eq!(row.try_get_named::<String>("name").unwrap(), "ann");
    }

    #[test]
    fn decode_errors_name_the_column() {
        let row = Row::from_pairs([("name", Value::Null)]);
        match row.try_get::<String>(0).unwrap_err() {
            RunnerError::Decode { column, .. } => assert_eq!(column, "name"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_index_is_a_decode_error() {
        let row = Row::from_pairs([("id", Value::Int(1))]);
        assert!(matches!(
            row.try_get::<i64>(4),
            Err(RunnerError::Decode { .. })
        ));
    }
}
