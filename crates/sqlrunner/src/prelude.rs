//! Convenient imports for typical `sqlrunner` usage.
//!
//! ```ignore
//! use sqlrunner::prelude::*;
//! ```

pub use crate::{
    ExecResult, Executor, Op, Predicate, Record, Row, Runner, RunnerConfig, RunnerError,
    RunnerResult, TableName, TagFamily, Value,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteExecutor;
