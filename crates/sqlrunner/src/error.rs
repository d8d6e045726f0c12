//! Error types for sqlrunner

use thiserror::Error;

/// Result type alias for sqlrunner operations
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Error types for building and running statements
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Programmer mistake: the call can never produce correct SQL
    #[error("Usage error: {0}")]
    Usage(String),

    /// Statement could not be rendered
    #[error("Build error: {0}")]
    Build(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Executor connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution error reported by an executor
    #[error("Execution error: {0}")]
    Execution(String),

    /// SQLite driver error, passed through unchanged
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
}

impl RunnerError {
    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create a build error
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Check if this is a usage error
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Check if this is a build error
    pub fn is_build(&self) -> bool {
        matches!(self, Self::Build(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Re-label a decode error with the column it was read from.
    pub(crate) fn for_column(self, column: &str) -> Self {
        match self {
            Self::Decode { message, .. } => Self::Decode {
                column: column.to_string(),
                message,
            },
            other => other,
        }
    }
}
