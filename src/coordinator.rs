//! Deletion coordinator: one operation at a time across the remote store, the
//! local store and the derived baseline.
//!
//! Every operation runs the same sequence: confirmation, remote phase, local
//! phase (unless the scope keeps local data), baseline reset. Progress for each
//! phase is mapped into the slice of `[0, 1]` assigned by [`PhasePlan`].

pub mod confirmation;
pub mod guard;
pub mod plan;

pub use confirmation::{AutoConfirm, ConfirmationGate, FnGate, PendingConfirmation};
pub use guard::{CoordinatorState, OperationGuard};
pub use plan::PhasePlan;

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::baseline::BaselineResetter;
use crate::config::DeletionConfig;
use crate::error::DeletionError;
use crate::local::{LocalBulkDeleter, LocalStore};
use crate::progress::{
    new_operation_id, DeletionProgress, Phase, ProgressBus, ProgressEvent, ProgressTracker,
};
use crate::remote::{RemoteBulkDeleter, RemoteRecordStore};
use crate::report::DeletionResult;
use crate::telemetry::{Counter, DeletionMetrics, TracingMetrics};
use crate::types::{DeletionScope, RecordType};
use guard::Slot;

pub struct DeletionCoordinator {
    remote: Arc<dyn RemoteRecordStore>,
    local: Arc<dyn LocalStore>,
    baseline: Arc<dyn BaselineResetter>,
    settings: DeletionConfig,
    metrics: Arc<dyn DeletionMetrics>,
    bus: ProgressBus,
    snapshot: Arc<RwLock<DeletionProgress>>,
    slot: Arc<Mutex<Slot>>,
}

impl DeletionCoordinator {
    pub fn new(
        remote: Arc<dyn RemoteRecordStore>,
        local: Arc<dyn LocalStore>,
        baseline: Arc<dyn BaselineResetter>,
    ) -> Self {
        Self {
            remote,
            local,
            baseline,
            settings: DeletionConfig::default(),
            metrics: Arc::new(TracingMetrics),
            bus: ProgressBus::new(),
            snapshot: Arc::new(RwLock::new(DeletionProgress::default())),
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn with_settings(mut self, settings: DeletionConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn DeletionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn settings(&self) -> &DeletionConfig {
        &self.settings
    }

    /// Current progress snapshot.
    pub fn progress(&self) -> DeletionProgress {
        self.snapshot.read().clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.slot.lock().state()
    }

    /// Receive every progress event published from now on, in order.
    pub fn subscribe(&self) -> Receiver<ProgressEvent> {
        self.bus.subscribe()
    }

    /// Ask the running operation to stop at its next suspension point.
    ///
    /// Returns `false` when nothing is running.
    pub fn cancel(&self) -> bool {
        match self.slot.lock().cancel_flag() {
            Some(flag) => {
                flag.cancel();
                info!("cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Reserve the coordinator for `scope` without touching any store.
    pub fn begin(&self, scope: DeletionScope) -> Result<PendingConfirmation<'_>, DeletionError> {
        if let Err(msg) = scope.validate() {
            self.metrics.increment(Counter::OperationsRejected, 1);
            return Err(DeletionError::InvalidScope(msg));
        }

        let tracker = ProgressTracker::new(
            new_operation_id(),
            self.bus.clone(),
            Arc::clone(&self.snapshot),
        );
        let guard = match OperationGuard::acquire(&self.slot, tracker, Arc::clone(&self.metrics)) {
            Ok(guard) => guard,
            Err(err) => {
                warn!(scope = scope.name(), "rejected: another deletion is in progress");
                self.metrics.increment(Counter::OperationsRejected, 1);
                return Err(err);
            }
        };
        guard.tracker().awaiting_confirmation(&scope.to_string());
        info!(
            operation = guard.tracker().operation(),
            scope = scope.name(),
            "awaiting confirmation"
        );
        Ok(PendingConfirmation {
            coordinator: self,
            scope,
            guard,
        })
    }

    /// Confirm through `gate` (if any) and run `scope` to completion.
    pub async fn delete_all(
        &self,
        scope: DeletionScope,
        gate: Option<&dyn ConfirmationGate>,
    ) -> Result<DeletionResult, DeletionError> {
        let pending = self.begin(scope)?;
        if let Some(gate) = gate {
            if !gate.confirm(&scope).await {
                pending.cancel();
                return Err(DeletionError::Cancelled);
            }
        }
        pending.commit().await
    }

    pub async fn delete_before(
        &self,
        record_type: RecordType,
        cutoff: DateTime<Utc>,
        gate: Option<&dyn ConfirmationGate>,
    ) -> Result<DeletionResult, DeletionError> {
        self.delete_all(DeletionScope::BeforeDate { record_type, cutoff }, gate)
            .await
    }

    pub async fn delete_in_range(
        &self,
        record_type: RecordType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        gate: Option<&dyn ConfirmationGate>,
    ) -> Result<DeletionResult, DeletionError> {
        self.delete_all(
            DeletionScope::InRange {
                record_type,
                start,
                end,
            },
            gate,
        )
        .await
    }

    /// Remove every remote record while keeping local data.
    pub async fn reset_remote(
        &self,
        gate: Option<&dyn ConfirmationGate>,
    ) -> Result<DeletionResult, DeletionError> {
        self.delete_all(DeletionScope::RemoteOnlyReset, gate).await
    }

    /// Remove everything, remote and local, and reset the baseline.
    pub async fn factory_reset(
        &self,
        gate: Option<&dyn ConfirmationGate>,
    ) -> Result<DeletionResult, DeletionError> {
        self.delete_all(DeletionScope::FactoryReset, gate).await
    }

    pub(crate) async fn execute(
        &self,
        scope: DeletionScope,
        guard: OperationGuard,
    ) -> Result<DeletionResult, DeletionError> {
        let started = Instant::now();
        self.metrics.increment(Counter::OperationsStarted, 1);

        let outcome = match guard.cancel_flag().check() {
            Ok(()) => {
                guard.tracker().started(&scope.to_string());
                info!(
                    operation = guard.tracker().operation(),
                    scope = scope.name(),
                    "deletion started"
                );
                self.run_phases(&scope, &guard).await
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(result) => {
                info!(
                    operation = guard.tracker().operation(),
                    remote = result.records_deleted_remote,
                    local = result.records_deleted_local,
                    issues = result.errors.len(),
                    truncated = result.truncated.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "deletion completed"
                );
                guard.complete(&result);
                Ok(result)
            }
            Err(err) => {
                if err == DeletionError::Cancelled {
                    info!(operation = guard.tracker().operation(), "deletion cancelled");
                } else {
                    error!(
                        operation = guard.tracker().operation(),
                        code = err.code(),
                        error = %err,
                        "deletion failed"
                    );
                }
                guard.abort(&err);
                Err(err)
            }
        }
    }

    async fn run_phases(
        &self,
        scope: &DeletionScope,
        guard: &OperationGuard,
    ) -> Result<DeletionResult, DeletionError> {
        let plan = PhasePlan::for_scope(scope);
        let predicate = scope.predicate();
        let tracker = guard.tracker();
        let cancel = guard.cancel_flag();
        let mut result = DeletionResult::default();

        guard.set_state(CoordinatorState::RunningRemotePhase);
        let phase_started = Instant::now();
        let remote = RemoteBulkDeleter::new(
            self.remote.as_ref(),
            &self.settings,
            self.metrics.as_ref(),
            cancel,
        );
        for (record_type, range) in &plan.remote {
            let progress = tracker.phase(
                Phase::Remote,
                Some(*record_type),
                format!("Deleting remote {} records", record_type),
                *range,
            );
            let sweep = remote
                .delete_matching(*record_type, predicate, &progress)
                .await?;
            result.records_deleted_remote += sweep.deleted;
            result.errors.extend(sweep.issues);
            if sweep.truncated {
                result.truncated.push(*record_type);
            }
        }
        self.metrics
            .phase_duration(Phase::Remote, phase_started.elapsed());

        if !plan.local.is_empty() {
            guard.set_state(CoordinatorState::RunningLocalPhase);
            let phase_started = Instant::now();
            let local = LocalBulkDeleter::new(
                self.local.as_ref(),
                &self.settings,
                self.metrics.as_ref(),
                cancel,
            );
            for (record_type, range) in &plan.local {
                let progress = tracker.phase(
                    Phase::Local,
                    Some(*record_type),
                    format!("Deleting local {} records", record_type),
                    *range,
                );
                result.records_deleted_local += local
                    .delete_matching(*record_type, predicate, &progress)
                    .await?;
            }
            self.metrics
                .phase_duration(Phase::Local, phase_started.elapsed());
        }

        if let Some(range) = plan.baseline {
            guard.set_state(CoordinatorState::ResettingDerivedState);
            cancel.check()?;
            let phase_started = Instant::now();
            let progress = tracker.phase(
                Phase::BaselineReset,
                None,
                "Resetting personal baseline",
                range,
            );
            if let Err(err) = self.baseline.reset_to_default().await {
                error!(
                    error = %err,
                    remote = result.records_deleted_remote,
                    local = result.records_deleted_local,
                    "baseline reset failed after records were already deleted"
                );
                return Err(err.into());
            }
            progress.finish();
            result.baseline_reset = true;
            self.metrics.increment(Counter::BaselineResets, 1);
            self.metrics
                .phase_duration(Phase::BaselineReset, phase_started.elapsed());
        }

        Ok(result)
    }
}
