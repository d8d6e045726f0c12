use super::truncate_sql_bytes;
use super::types::{SqlEvent, SqlSink};
use tracing::Level;

/// A `tracing`-based sink that emits every executed statement.
///
/// Events go to the `sqlrunner.sql` target; failed statements are always
/// emitted at `WARN` or above.
#[derive(Debug, Clone)]
pub struct TracingSink {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl SqlSink for TracingSink {
    fn record(&self, event: &SqlEvent) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let level = if event.outcome.is_error() {
            self.level.min(Level::WARN)
        } else {
            self.level
        };
        let sql = self.truncate_sql(&event.sql);
        emit_at_level!(
            level,
            target: "sqlrunner.sql",
            query_type = ?event.query_type,
            param_count = event.args.len(),
            elapsed_us = event.elapsed.as_micros() as u64,
            outcome = %event.outcome,
            sql = %sql,
        );
    }
}
