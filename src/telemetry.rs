//! Injected metrics for deletion operations.
//!
//! The coordinator receives an `Arc<dyn DeletionMetrics>` at construction; there
//! is no process-wide default. `TracingMetrics` forwards to `tracing`,
//! `InMemoryMetrics` keeps counters for inspection.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::progress::Phase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Counter {
    OperationsStarted,
    OperationsRejected,
    OperationsCancelled,
    OperationsFailed,
    RemoteQueries,
    RemotePages,
    RemoteBatches,
    RemoteBatchFailures,
    RemoteRecordFailures,
    RecordsDeletedRemote,
    LocalCommits,
    RecordsDeletedLocal,
    BaselineResets,
}

impl Counter {
    pub fn as_str(self) -> &'static str {
        match self {
            Counter::OperationsStarted => "operations_started",
            Counter::OperationsRejected => "operations_rejected",
            Counter::OperationsCancelled => "operations_cancelled",
            Counter::OperationsFailed => "operations_failed",
            Counter::RemoteQueries => "remote_queries",
            Counter::RemotePages => "remote_pages",
            Counter::RemoteBatches => "remote_batches",
            Counter::RemoteBatchFailures => "remote_batch_failures",
            Counter::RemoteRecordFailures => "remote_record_failures",
            Counter::RecordsDeletedRemote => "records_deleted_remote",
            Counter::LocalCommits => "local_commits",
            Counter::RecordsDeletedLocal => "records_deleted_local",
            Counter::BaselineResets => "baseline_resets",
        }
    }
}

pub trait DeletionMetrics: Send + Sync {
    fn increment(&self, counter: Counter, by: u64);

    fn phase_duration(&self, phase: Phase, elapsed: Duration);
}

/// Emits every measurement as a `debug` event on the `erasure::metrics` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl DeletionMetrics for TracingMetrics {
    fn increment(&self, counter: Counter, by: u64) {
        debug!(target: "erasure::metrics", counter = counter.as_str(), by, "counter");
    }

    fn phase_duration(&self, phase: Phase, elapsed: Duration) {
        debug!(
            target: "erasure::metrics",
            phase = phase.as_str(),
            duration_ms = elapsed.as_millis() as u64,
            "phase duration"
        );
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    counters: Mutex<BTreeMap<Counter, u64>>,
    durations: Mutex<Vec<(Phase, Duration)>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.counters.lock().get(&counter).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<Counter, u64> {
        self.counters.lock().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.durations.lock().iter().map(|(p, _)| *p).collect()
    }
}

impl DeletionMetrics for InMemoryMetrics {
    fn increment(&self, counter: Counter, by: u64) {
        *self.counters.lock().entry(counter).or_insert(0) += by;
    }

    fn phase_duration(&self, phase: Phase, elapsed: Duration) {
        self.durations.lock().push((phase, elapsed));
    }
}
