//! Per-operation progress owner.
//!
//! The tracker is the only writer of the shared `DeletionProgress` snapshot and
//! the only publisher of an operation's events. Fractions are folded with
//! `max(previous, new)` so observers never see progress go backwards.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::DeletionError;
use crate::progress::bus::ProgressBus;
use crate::progress::event::{DeletionProgress, Phase, ProgressEvent, ProgressEventKind};
use crate::progress::range::ProgressRange;
use crate::progress::now_millis;
use crate::report::{DeletionIssue, DeletionResult};
use crate::types::RecordType;

struct TrackerState {
    next_seq: u64,
    fraction: f64,
    records_deleted: u64,
}

pub struct ProgressTracker {
    operation: String,
    bus: ProgressBus,
    snapshot: Arc<RwLock<DeletionProgress>>,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    pub fn new(
        operation: impl Into<String>,
        bus: ProgressBus,
        snapshot: Arc<RwLock<DeletionProgress>>,
    ) -> Self {
        Self {
            operation: operation.into(),
            bus,
            snapshot,
            state: Mutex::new(TrackerState {
                next_seq: 1,
                fraction: 0.0,
                records_deleted: 0,
            }),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn fraction(&self) -> f64 {
        self.state.lock().fraction
    }

    pub fn records_deleted(&self) -> u64 {
        self.state.lock().records_deleted
    }

    pub fn awaiting_confirmation(&self, scope: &str) {
        {
            let mut snap = self.snapshot.write();
            *snap = DeletionProgress {
                in_progress: true,
                fraction: 0.0,
                current_step: "Awaiting confirmation".to_string(),
                records_deleted: 0,
            };
        }
        self.emit(ProgressEventKind::AwaitingConfirmation {
            scope: scope.to_string(),
        });
    }

    pub fn started(&self, scope: &str) {
        {
            let mut snap = self.snapshot.write();
            snap.in_progress = true;
            snap.current_step = format!("Deleting {}", scope);
        }
        self.emit(ProgressEventKind::OperationStarted {
            scope: scope.to_string(),
        });
    }

    /// Enter a phase; the returned handle maps phase-local progress into `range`.
    pub fn phase(
        &self,
        phase: Phase,
        record_type: Option<RecordType>,
        description: impl Into<String>,
        range: ProgressRange,
    ) -> PhaseProgress<'_> {
        let description = description.into();
        self.snapshot.write().current_step = description.clone();
        self.emit(ProgressEventKind::PhaseStarted {
            phase,
            record_type,
            description,
            lo: range.lo(),
            hi: range.hi(),
        });
        let handle = PhaseProgress {
            tracker: self,
            phase,
            range,
        };
        handle.report(0.0);
        handle
    }

    pub fn issue(&self, issue: &DeletionIssue) {
        self.emit(ProgressEventKind::IssueRecorded {
            record_type: issue.record_type,
            stage: issue.stage.to_string(),
            code: issue.error.code().to_string(),
            message: issue.error.to_string(),
        });
    }

    pub fn completed(&self, result: &DeletionResult) {
        {
            let mut state = self.state.lock();
            state.fraction = 1.0;
            let mut snap = self.snapshot.write();
            snap.in_progress = false;
            snap.fraction = 1.0;
            snap.current_step = "Completed".to_string();
            snap.records_deleted = state.records_deleted;
        }
        self.emit(ProgressEventKind::OperationCompleted {
            records_deleted_remote: result.records_deleted_remote,
            records_deleted_local: result.records_deleted_local,
            issues: result.errors.len(),
        });
    }

    pub fn failed(&self, err: &DeletionError) {
        self.reset_snapshot();
        self.emit(ProgressEventKind::OperationFailed {
            code: err.code().to_string(),
            message: err.to_string(),
        });
    }

    pub fn cancelled(&self) {
        self.reset_snapshot();
        self.emit(ProgressEventKind::OperationCancelled);
    }

    fn reset_snapshot(&self) {
        *self.snapshot.write() = DeletionProgress::default();
    }

    fn add_deleted(&self, count: u64) {
        let mut state = self.state.lock();
        state.records_deleted += count;
        self.snapshot.write().records_deleted = state.records_deleted;
    }

    fn advance(&self, phase: Phase, fraction: f64) {
        let mut state = self.state.lock();
        state.fraction = state.fraction.max(fraction);
        let fraction = state.fraction;
        let records_deleted = state.records_deleted;
        self.snapshot.write().fraction = fraction;
        self.publish_locked(
            &mut state,
            ProgressEventKind::Progress {
                phase,
                fraction,
                records_deleted,
            },
        );
    }

    fn emit(&self, kind: ProgressEventKind) {
        let mut state = self.state.lock();
        self.publish_locked(&mut state, kind);
    }

    fn publish_locked(&self, state: &mut TrackerState, kind: ProgressEventKind) {
        let seq = state.next_seq;
        state.next_seq += 1;
        self.bus.publish(ProgressEvent {
            ts: now_millis().to_string(),
            operation: self.operation.clone(),
            seq,
            kind,
        });
    }
}

/// Handle given to a deleter for the duration of one phase.
pub struct PhaseProgress<'a> {
    tracker: &'a ProgressTracker,
    phase: Phase,
    range: ProgressRange,
}

impl<'a> PhaseProgress<'a> {
    pub fn range(&self) -> ProgressRange {
        self.range
    }

    /// Report phase-local progress `p ∈ [0, 1]`.
    pub fn report(&self, p: f64) {
        self.tracker.advance(self.phase, self.range.map(p));
    }

    /// Count records that are confirmed gone. Call before the matching `report`.
    pub fn deleted(&self, count: u64) {
        if count > 0 {
            self.tracker.add_deleted(count);
        }
    }

    pub fn issue(&self, issue: &DeletionIssue) {
        self.tracker.issue(issue);
    }

    pub fn finish(&self) {
        self.report(1.0);
    }
}
