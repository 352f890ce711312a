//! Single-pass local deletion: fetch, mark, commit once.

use tracing::{debug, info};

use crate::cancel::CancelFlag;
use crate::config::DeletionConfig;
use crate::error::DeletionError;
use crate::local::{EntityKey, LocalStore};
use crate::progress::PhaseProgress;
use crate::telemetry::{Counter, DeletionMetrics};
use crate::types::{Predicate, RecordType};

/// Share of the phase range spent marking; the commit covers the rest.
const MARKING_SHARE: f64 = 0.9;

pub struct LocalBulkDeleter<'a, L: LocalStore + ?Sized> {
    store: &'a L,
    progress_step: f64,
    metrics: &'a dyn DeletionMetrics,
    cancel: &'a CancelFlag,
}

impl<'a, L: LocalStore + ?Sized> LocalBulkDeleter<'a, L> {
    pub fn new(
        store: &'a L,
        settings: &DeletionConfig,
        metrics: &'a dyn DeletionMetrics,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            store,
            progress_step: settings.local_progress_step,
            metrics,
            cancel,
        }
    }

    /// Delete every local entity of `record_type` matching `predicate`.
    ///
    /// Any failure fails the phase; the commit is all-or-nothing.
    pub async fn delete_matching(
        &self,
        record_type: RecordType,
        predicate: Predicate,
        progress: &PhaseProgress<'_>,
    ) -> Result<u64, DeletionError> {
        self.cancel.check()?;
        let matched = self.store.fetch(record_type, &predicate).await?;
        self.cancel.check()?;

        if matched.is_empty() {
            debug!(record_type = %record_type, "no local entities matched");
            progress.finish();
            return Ok(0);
        }

        let total = matched.len();
        let every = report_interval(total, self.progress_step);
        let mut marked: Vec<EntityKey> = Vec::with_capacity(total);
        for key in matched {
            marked.push(key);
            if marked.len() % every == 0 || marked.len() == total {
                progress.report(MARKING_SHARE * marked.len() as f64 / total as f64);
            }
        }

        self.cancel.check()?;
        let deleted = self.store.commit_deletions(record_type, &marked).await?;
        self.metrics.increment(Counter::LocalCommits, 1);
        self.metrics.increment(Counter::RecordsDeletedLocal, deleted);
        progress.deleted(deleted);
        progress.finish();
        info!(record_type = %record_type, deleted, "local deletions committed");
        Ok(deleted)
    }
}

/// Items between progress reports for a given fractional step.
fn report_interval(total: usize, step: f64) -> usize {
    let step = if step.is_finite() && step > 0.0 { step.min(1.0) } else { 0.1 };
    ((total as f64 * step).ceil() as usize).max(1)
}
