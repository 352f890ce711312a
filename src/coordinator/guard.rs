//! Coordinator lifecycle state and the per-operation RAII guard.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cancel::CancelFlag;
use crate::error::DeletionError;
use crate::progress::ProgressTracker;
use crate::report::DeletionResult;
use crate::telemetry::{Counter, DeletionMetrics};

/// Where the coordinator is in its single-operation lifecycle.
///
/// `Idle → AwaitingConfirmation → {Aborted | RunningRemotePhase →
/// RunningLocalPhase → ResettingDerivedState → Completed} → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    AwaitingConfirmation,
    RunningRemotePhase,
    RunningLocalPhase,
    ResettingDerivedState,
    Completed,
    Aborted,
}

impl CoordinatorState {
    pub fn as_str(self) -> &'static str {
        match self {
            CoordinatorState::Idle => "idle",
            CoordinatorState::AwaitingConfirmation => "awaiting_confirmation",
            CoordinatorState::RunningRemotePhase => "running_remote_phase",
            CoordinatorState::RunningLocalPhase => "running_local_phase",
            CoordinatorState::ResettingDerivedState => "resetting_derived_state",
            CoordinatorState::Completed => "completed",
            CoordinatorState::Aborted => "aborted",
        }
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State shared between the coordinator and the guard of its current operation.
#[derive(Default)]
pub(crate) struct Slot {
    state: Option<CoordinatorState>,
    cancel: Option<CancelFlag>,
}

impl Slot {
    pub(crate) fn state(&self) -> CoordinatorState {
        self.state.unwrap_or(CoordinatorState::Idle)
    }

    pub(crate) fn cancel_flag(&self) -> Option<&CancelFlag> {
        self.cancel.as_ref()
    }
}

/// Holds the coordinator's single operation slot for its lifetime.
///
/// Dropping the guard before `complete` or `abort` (a dropped future, a
/// discarded confirmation) counts as cancellation: the tracker publishes
/// `operation_cancelled` and resets the snapshot, and the slot returns to idle.
pub struct OperationGuard {
    slot: Arc<Mutex<Slot>>,
    tracker: ProgressTracker,
    cancel: CancelFlag,
    metrics: Arc<dyn DeletionMetrics>,
    finished: bool,
}

impl OperationGuard {
    pub(crate) fn acquire(
        slot: &Arc<Mutex<Slot>>,
        tracker: ProgressTracker,
        metrics: Arc<dyn DeletionMetrics>,
    ) -> Result<Self, DeletionError> {
        let cancel = CancelFlag::new();
        {
            let mut guard = slot.lock();
            if guard.state.is_some() {
                return Err(DeletionError::OperationInProgress);
            }
            guard.state = Some(CoordinatorState::AwaitingConfirmation);
            guard.cancel = Some(cancel.clone());
        }
        debug!(operation = tracker.operation(), "operation slot acquired");
        Ok(Self {
            slot: Arc::clone(slot),
            tracker,
            cancel,
            metrics,
            finished: false,
        })
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub fn set_state(&self, state: CoordinatorState) {
        self.slot.lock().state = Some(state);
    }

    pub fn complete(mut self, result: &DeletionResult) {
        self.set_state(CoordinatorState::Completed);
        self.tracker.completed(result);
        self.finished = true;
    }

    /// Close the operation with a fatal error or a cancellation.
    pub fn abort(mut self, err: &DeletionError) {
        self.set_state(CoordinatorState::Aborted);
        if *err == DeletionError::Cancelled {
            self.metrics.increment(Counter::OperationsCancelled, 1);
            self.tracker.cancelled();
        } else {
            self.metrics.increment(Counter::OperationsFailed, 1);
            self.tracker.failed(err);
        }
        self.finished = true;
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        if !self.finished {
            warn!(
                operation = self.tracker.operation(),
                "operation dropped before finishing; treating as cancelled"
            );
            self.cancel.cancel();
            self.metrics.increment(Counter::OperationsCancelled, 1);
            self.tracker.cancelled();
        }
        let mut slot = self.slot.lock();
        slot.state = None;
        slot.cancel = None;
    }
}
