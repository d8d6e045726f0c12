use crate::value::Value;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// The type of SQL operation being performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    /// SELECT query
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// Other SQL (e.g., DDL, custom)
    Other,
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.len() >= keyword.len()
        && sql.as_bytes()[..keyword.len()].eq_ignore_ascii_case(keyword.as_bytes())
        && sql[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_')
}

impl QueryType {
    /// Detect query type from the leading keyword of a SQL string.
    ///
    /// For CTEs (`WITH ...`), looks past the CTE definitions to find the
    /// statement keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else if starts_with_keyword(trimmed, "WITH") {
            Self::detect_cte_dml(trimmed)
        } else {
            QueryType::Other
        }
    }

    /// The statement following the last top-level closing paren of a CTE list.
    fn detect_cte_dml(sql: &str) -> Self {
        let mut depth: i32 = 0;
        let mut last_top_level = 0;
        let mut in_string = false;
        for (i, b) in sql.bytes().enumerate() {
            match b {
                b'\'' => in_string = !in_string,
                b'(' if !in_string => depth += 1,
                b')' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        last_top_level = i + 1;
                    }
                }
                _ => {}
            }
        }

        let remainder = sql[last_top_level..].trim_start();
        if starts_with_keyword(remainder, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(remainder, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(remainder, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Select
        }
    }
}

/// Maximum length for error messages in `SqlOutcome::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Result of a statement execution for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlOutcome {
    /// Query returned rows.
    Rows(usize),
    /// Statement affected rows.
    Affected(u64),
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl SqlOutcome {
    /// Create an error outcome, truncating long messages.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", super::truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for SqlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlOutcome::Rows(n) => write!(f, "{n} rows"),
            SqlOutcome::Affected(n) => write!(f, "{n} affected"),
            SqlOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// One executed statement, as reported to a [`SqlSink`].
#[derive(Debug, Clone, Serialize)]
pub struct SqlEvent {
    pub query_type: QueryType,
    pub sql: String,
    pub args: Vec<Value>,
    pub elapsed: Duration,
    pub outcome: SqlOutcome,
}

impl SqlEvent {
    pub fn new(sql: &str, args: &[Value], elapsed: Duration, outcome: SqlOutcome) -> Self {
        Self {
            query_type: QueryType::from_sql(sql),
            sql: sql.to_string(),
            args: args.to_vec(),
            elapsed,
            outcome,
        }
    }
}

/// Receiver of statement diagnostics.
///
/// The runner only builds an event when tracing is turned on in its config and
/// [`SqlSink::is_enabled`] returns `true`.
pub trait SqlSink: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }

    fn record(&self, event: &SqlEvent);
}

impl<S: SqlSink + ?Sized> SqlSink for std::sync::Arc<S> {
    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn record(&self, event: &SqlEvent) {
        (**self).record(event)
    }
}
