//! Shared WHERE clause builder for SELECT, UPDATE, DELETE.

use crate::error::{RunnerError, RunnerResult};
use crate::value::{ToValue, Value};
use std::fmt;
use std::str::FromStr;

/// Comparison operator for a `column <op> ?` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for Op {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Op::Eq),
            "!=" | "<>" => Ok(Op::Ne),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Gte),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Lte),
            "LIKE" => Ok(Op::Like),
            "NOT LIKE" => Ok(Op::NotLike),
            _ => Err(RunnerError::usage(format!("unsupported operator `{s}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connector {
    And,
    Or,
}

impl Connector {
    fn as_sql(self) -> &'static str {
        match self {
            Connector::And => " AND ",
            Connector::Or => " OR ",
        }
    }
}

/// One condition: SQL text with `?` placeholders and exactly as many args.
#[derive(Debug, Clone)]
struct Node {
    connector: Connector,
    sql: String,
    args: Vec<Value>,
}

/// Reusable WHERE clause builder.
///
/// Conditions are joined left to right by their own connector; mixed AND/OR
/// chains are not parenthesized. Use [`Predicate::and_group`] to group.
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    nodes: Vec<Node>,
    /// Build error (validated at render time)
    build_error: Option<String>,
}

/// Count `?` placeholders outside `'..'` literals and `".."` identifiers.
fn count_placeholders(fragment: &str) -> usize {
    let mut quote: Option<char> = None;
    let mut count = 0;
    for c in fragment.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '?') => count += 1,
            (None, _) => {}
        }
    }
    count
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any conditions have been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Remove every condition and any recorded build error.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.build_error = None;
    }

    fn push(&mut self, connector: Connector, sql: String, args: Vec<Value>) -> &mut Self {
        self.nodes.push(Node {
            connector,
            sql,
            args,
        });
        self
    }

    fn push_list<I>(&mut self, connector: Connector, col: &str, keyword: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        let args: Vec<Value> = values.into_iter().map(|v| v.to_value()).collect();
        if args.is_empty() {
            if keyword == "IN" {
                return self.push(connector, "1=0".to_string(), Vec::new());
            }
            return self;
        }
        let placeholders = vec!["?"; args.len()].join(", ");
        self.push(connector, format!("{col} {keyword} ({placeholders})"), args)
    }

    fn push_raw(&mut self, connector: Connector, fragment: &str, args: Vec<Value>) -> &mut Self {
        let placeholder_count = count_placeholders(fragment);
        if placeholder_count != args.len() {
            self.build_error = Some(format!(
                "Predicate param mismatch: fragment '{}' has {} '?', but {} values provided",
                fragment,
                placeholder_count,
                args.len()
            ));
            return self;
        }
        self.push(connector, fragment.to_string(), args)
    }

    fn push_group(&mut self, connector: Connector, other: &Predicate) -> &mut Self {
        if let Some(err) = &other.build_error {
            self.build_error = Some(err.clone());
            return self;
        }
        if other.is_empty() {
            return self;
        }
        let (sql, args) = other.render_parts();
        self.push(connector, format!("({sql})"), args)
    }

    // ==================== Conditions ====================

    /// Add `col <op> ?` joined by AND.
    pub fn and_where(&mut self, col: &str, op: Op, val: impl ToValue) -> &mut Self {
        self.push(Connector::And, format!("{col} {op} ?"), vec![val.to_value()])
    }

    /// Add `col <op> ?` joined by OR.
    pub fn or_where(&mut self, col: &str, op: Op, val: impl ToValue) -> &mut Self {
        self.push(Connector::Or, format!("{col} {op} ?"), vec![val.to_value()])
    }

    /// Add AND equality condition.
    pub fn and_eq(&mut self, col: &str, val: impl ToValue) -> &mut Self {
        self.and_where(col, Op::Eq, val)
    }

    /// Add OR equality condition.
    pub fn or_eq(&mut self, col: &str, val: impl ToValue) -> &mut Self {
        self.or_where(col, Op::Eq, val)
    }

    /// Add AND IN (...) condition. An empty list matches nothing.
    pub fn and_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.push_list(Connector::And, col, "IN", values)
    }

    /// Add OR IN (...) condition. An empty list matches nothing.
    pub fn or_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.push_list(Connector::Or, col, "IN", values)
    }

    /// Add AND NOT IN (...) condition. An empty list adds nothing.
    pub fn and_not_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.push_list(Connector::And, col, "NOT IN", values)
    }

    /// Add OR NOT IN (...) condition. An empty list adds nothing.
    pub fn or_not_in<I>(&mut self, col: &str, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: ToValue,
    {
        self.push_list(Connector::Or, col, "NOT IN", values)
    }

    /// Add AND LIKE condition.
    pub fn and_like(&mut self, col: &str, pattern: impl ToValue) -> &mut Self {
        self.and_where(col, Op::Like, pattern)
    }

    /// Add OR LIKE condition.
    pub fn or_like(&mut self, col: &str, pattern: impl ToValue) -> &mut Self {
        self.or_where(col, Op::Like, pattern)
    }

    /// Add AND IS NULL condition.
    pub fn and_null(&mut self, col: &str) -> &mut Self {
        self.push(Connector::And, format!("{col} IS NULL"), Vec::new())
    }

    /// Add AND IS NOT NULL condition.
    pub fn and_not_null(&mut self, col: &str) -> &mut Self {
        self.push(Connector::And, format!("{col} IS NOT NULL"), Vec::new())
    }

    /// Add a raw fragment with its own `?` arguments, joined by AND.
    ///
    /// The fragment is concatenated into the statement as written, so it must
    /// never contain untrusted input; pass values through `args` instead.
    /// A `?` inside a quoted literal or identifier is not a placeholder.
    pub fn and_raw(&mut self, fragment: &str, args: Vec<Value>) -> &mut Self {
        self.push_raw(Connector::And, fragment, args)
    }

    /// Add a raw fragment with its own `?` arguments, joined by OR.
    pub fn or_raw(&mut self, fragment: &str, args: Vec<Value>) -> &mut Self {
        self.push_raw(Connector::Or, fragment, args)
    }

    /// Merge `other` as one parenthesized group joined by AND.
    pub fn and_group(&mut self, other: &Predicate) -> &mut Self {
        self.push_group(Connector::And, other)
    }

    /// Merge `other` as one parenthesized group joined by OR.
    pub fn or_group(&mut self, other: &Predicate) -> &mut Self {
        self.push_group(Connector::Or, other)
    }

    // ==================== Rendering ====================

    fn render_parts(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut args = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                sql.push_str(node.connector.as_sql());
            }
            sql.push_str(&node.sql);
            args.extend(node.args.iter().cloned());
        }
        (sql, args)
    }

    /// Render the condition text (without "WHERE") and its args in append order.
    ///
    /// An empty predicate renders to an empty string.
    pub fn render(&self) -> RunnerResult<(String, Vec<Value>)> {
        if let Some(err) = &self.build_error {
            return Err(RunnerError::build(err.clone()));
        }
        Ok(self.render_parts())
    }

    /// Append ` WHERE <conditions>` and their args, if there are any.
    pub(crate) fn write_where(&self, sql: &mut String, args: &mut Vec<Value>) -> RunnerResult<()> {
        let (clause, clause_args) = self.render()?;
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
            args.extend(clause_args);
        }
        Ok(())
    }
}
