//! Metrics instrumentation for k8s-node-dns.
//!
//! All metrics are prefixed with `node_dns.`

use metrics::{counter, gauge, histogram, SharedString};
use std::time::{Duration, Instant};

/// Record a DNS query handled by the resolver.
pub fn record_query(record_type: SharedString, result: QueryResult, duration: Duration) {
    let result_str = match result {
        QueryResult::Answered => "answered",
        QueryResult::OutOfZone => "out_of_zone",
        QueryResult::UnsupportedType => "unsupported_type",
        QueryResult::NotFound => "not_found",
    };

    counter!("node_dns.query.count", "type" => record_type.clone(), "result" => result_str)
        .increment(1);
    histogram!("node_dns.query.duration.seconds", "type" => record_type)
        .record(duration.as_secs_f64());
}

/// Query result type for metrics.
#[derive(Debug, Clone, Copy)]
pub enum QueryResult {
    /// An A or AAAA record was returned.
    Answered,
    /// Name outside the zone, delegated.
    OutOfZone,
    /// Record type other than A/AAAA, delegated.
    UnsupportedType,
    /// Name not in the table, delegated.
    NotFound,
}

/// Record a query that fell off the end of the handler chain.
pub fn record_unhandled() {
    counter!("node_dns.query.unhandled.count").increment(1);
}

/// Record the outcome of one refresh cycle.
pub fn record_refresh(result: RefreshResult, duration: Duration) {
    let result_str = match result {
        RefreshResult::Success => "success",
        RefreshResult::Failed => "failed",
    };

    counter!("node_dns.refresh.count", "result" => result_str).increment(1);
    histogram!("node_dns.refresh.duration.seconds").record(duration.as_secs_f64());
}

/// Refresh outcome.
#[derive(Debug, Clone, Copy)]
pub enum RefreshResult {
    /// A new table generation was installed.
    Success,
    /// The node list could not be fetched; the table was left as is.
    Failed,
}

/// Record inventory items dropped during a refresh.
pub fn record_skipped_items(count: usize) {
    counter!("node_dns.refresh.skipped_items.count").increment(count as u64);
}

/// Record the size and generation of the installed table.
pub fn record_table_state(entries: usize, generation: u64) {
    gauge!("node_dns.table.entries").set(entries as f64);
    gauge!("node_dns.table.generation").set(generation as f64);
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
