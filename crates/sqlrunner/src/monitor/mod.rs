//! Statement diagnostics.
//!
//! Every statement a [`Runner`](crate::Runner) executes can be reported as a
//! [`SqlEvent`] to a [`SqlSink`]. Reporting is opt-in through
//! [`RunnerConfig::with_trace`](crate::RunnerConfig::with_trace).
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlrunner::monitor::{StatsSink, TracingSink};
//! use sqlrunner::RunnerConfig;
//! use std::sync::Arc;
//!
//! // Log statements through `tracing`
//! let config = RunnerConfig::new()
//!     .with_sink(Arc::new(TracingSink::new().max_sql_length(120)))
//!     .with_trace(true);
//!
//! // Or collect counters
//! let stats = Arc::new(StatsSink::new());
//! let config = RunnerConfig::new().with_sink(stats.clone()).with_trace(true);
//! ```

mod monitors;
mod tracing_hook;
mod types;


pub use monitors::{NoopSink, SqlStats, StatsSink};
pub use tracing_hook::TracingSink;
pub use types::{QueryType, SqlEvent, SqlOutcome, SqlSink};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
