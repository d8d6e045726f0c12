use super::types::{QueryType, SqlEvent, SqlSink};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// A sink that reports itself disabled and discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl SqlSink for NoopSink {
    fn is_enabled(&self) -> bool {
        false
    }

    fn record(&self, _event: &SqlEvent) {}
}

/// A sink that tracks statement statistics.
#[derive(Debug, Default)]
pub struct StatsSink {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
}

/// Collected statement statistics.
#[derive(Debug, Clone, Default)]
pub struct SqlStats {
    /// Total number of statements executed.
    pub total_queries: u64,
    /// Total number of failed statements.
    pub failed_queries: u64,
    /// Total execution time.
    pub total_duration: Duration,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    /// Slowest statement duration.
    pub max_duration: Duration,
    /// Slowest statement SQL.
    pub slowest_query: Option<String>,
}

impl StatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> SqlStats {
        SqlStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self
                .slowest_query
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.failed_queries,
            &self.total_duration_nanos,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.max_duration_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self.slowest_query.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl SqlSink for StatsSink {
    fn record(&self, event: &SqlEvent) {
        self.total_queries.fetch_add(1, Ordering::Relaxed);
        if event.outcome.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }

        let nanos = u64::try_from(event.elapsed.as_nanos()).unwrap_or(u64::MAX);
        let prev = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev.checked_add(nanos).is_none() {
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }

        let counter = match event.query_type {
            QueryType::Select => Some(&self.select_count),
            QueryType::Insert => Some(&self.insert_count),
            QueryType::Update => Some(&self.update_count),
            QueryType::Delete => Some(&self.delete_count),
            QueryType::Other => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        if self.max_duration_nanos.fetch_max(nanos, Ordering::Relaxed) < nanos {
            *self.slowest_query.lock().unwrap_or_else(|e| e.into_inner()) =
                Some(event.sql.clone());
        }
    }
}
