use crate::monitor::{SqlSink, TracingSink};
use crate::record::TagFamily;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Configuration a [`Runner`](crate::Runner) resolves once at construction.
///
/// By default columns use the `db` tag family, statement tracing is disabled
/// and executor calls have no timeout.
#[derive(Clone)]
pub struct RunnerConfig {
    /// Tag family used to resolve record field names.
    pub tag_family: TagFamily,
    /// Whether executed statements are reported to the sink.
    pub trace: bool,
    /// Diagnostics sink.
    pub sink: Arc<dyn SqlSink>,
    /// Executor call timeout. `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            tag_family: TagFamily::Db,
            trace: false,
            sink: Arc::new(TracingSink::default()),
            query_timeout: None,
        }
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("tag_family", &self.tag_family)
            .field("trace", &self.trace)
            .field("sink_enabled", &self.sink.is_enabled())
            .field("query_timeout", &self.query_timeout)
            .finish()
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag family used for record columns.
    pub fn with_tag_family(mut self, family: TagFamily) -> Self {
        self.tag_family = family;
        self
    }

    /// Turn statement tracing on or off.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Enable statement tracing.
    pub fn enable_tracing(self) -> Self {
        self.with_trace(true)
    }

    /// Replace the diagnostics sink.
    pub fn with_sink(mut self, sink: Arc<dyn SqlSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Bound every executor call.
    ///
    /// A call exceeding this duration is dropped and returns
    /// [`RunnerError::Timeout`](crate::RunnerError::Timeout).
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Whether an event should be built for an executed statement.
    pub(crate) fn tracing_active(&self) -> bool {
        self.trace && self.sink.is_enabled()
    }
}
