//! Rendered statements.

use crate::value::{ToValue, Value};
use std::fmt;

/// SQL text with `?` placeholders plus its positional arguments.
///
/// The Nth `?` binds the Nth argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    /// A statement from SQL text and any list of bindable values.
    pub fn with_args<I>(sql: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        Self::new(sql, args.into_iter().map(|v| v.to_value()).collect())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.args)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.sql, self.args)
    }
}
