//! Paginate-then-batch deletion against any [`RemoteRecordStore`].

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cancel::CancelFlag;
use crate::config::DeletionConfig;
use crate::error::{DeletionError, RemoteError};
use crate::progress::PhaseProgress;
use crate::remote::{RecordQuery, RemotePage, RemoteRecordStore};
use crate::report::{DeletionIssue, IssueStage};
use crate::telemetry::{Counter, DeletionMetrics};
use crate::translate::translate_remote;
use crate::types::{Predicate, RecordId, RecordType};

/// Outcome of sweeping one record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSweep {
    pub deleted: u64,
    pub issues: Vec<DeletionIssue>,
    /// Pagination stopped at the safety cap with records possibly left behind.
    pub truncated: bool,
}

pub struct RemoteBulkDeleter<'a, S: RemoteRecordStore + ?Sized> {
    store: &'a S,
    batch_size: usize,
    inter_batch_delay: Duration,
    pagination_cap: usize,
    metrics: &'a dyn DeletionMetrics,
    cancel: &'a CancelFlag,
}

struct Collected {
    ids: Vec<RecordId>,
    truncated: bool,
}

impl<'a, S: RemoteRecordStore + ?Sized> RemoteBulkDeleter<'a, S> {
    pub fn new(
        store: &'a S,
        settings: &DeletionConfig,
        metrics: &'a dyn DeletionMetrics,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            store,
            batch_size: settings.batch_size.max(1),
            inter_batch_delay: Duration::from_millis(settings.inter_batch_delay_ms),
            pagination_cap: settings.pagination_cap,
            metrics,
            cancel,
        }
    }

    /// Delete every record of `record_type` matching `predicate`.
    ///
    /// Returns `Err` only for failures that make further progress impossible
    /// (not authenticated, network unavailable, cancellation). Everything else
    /// lands in [`RemoteSweep::issues`].
    pub async fn delete_matching(
        &self,
        record_type: RecordType,
        predicate: Predicate,
        progress: &PhaseProgress<'_>,
    ) -> Result<RemoteSweep, DeletionError> {
        let mut sweep = RemoteSweep::default();
        let collected = self
            .collect_identifiers(record_type, predicate, progress, &mut sweep.issues)
            .await?;
        sweep.truncated = collected.truncated;

        if collected.ids.is_empty() {
            debug!(record_type = %record_type, "no remote records matched");
            progress.finish();
            return Ok(sweep);
        }

        sweep.deleted = self
            .delete_in_batches(record_type, &collected.ids, progress, &mut sweep.issues)
            .await?;
        info!(
            record_type = %record_type,
            matched = collected.ids.len(),
            deleted = sweep.deleted,
            issues = sweep.issues.len(),
            truncated = sweep.truncated,
            "remote sweep finished"
        );
        Ok(sweep)
    }

    async fn collect_identifiers(
        &self,
        record_type: RecordType,
        predicate: Predicate,
        progress: &PhaseProgress<'_>,
        issues: &mut Vec<DeletionIssue>,
    ) -> Result<Collected, DeletionError> {
        let query = RecordQuery::new(record_type, predicate);
        let mut ids = Vec::new();
        let mut seen = HashSet::new();

        self.cancel.check()?;
        self.metrics.increment(Counter::RemoteQueries, 1);
        let first = match self.store.query(&query).await {
            Ok(page) => page,
            Err(err) => {
                self.record_failure(record_type, IssueStage::Query, &err, progress, issues)?;
                return Ok(Collected {
                    ids,
                    truncated: false,
                });
            }
        };
        self.cancel.check()?;

        let mut cursor = first.cursor.clone();
        self.absorb(record_type, first, 0, &mut ids, &mut seen, progress, issues)?;

        let continuation = query.identifiers_only();
        let mut page_index = 1;
        let mut truncated = false;
        while let Some(current) = cursor.take() {
            if ids.len() >= self.pagination_cap {
                truncated = true;
                break;
            }
            self.metrics.increment(Counter::RemotePages, 1);
            let page = match self.store.continue_query(&continuation, &current).await {
                Ok(page) => page,
                Err(err) => {
                    self.record_failure(
                        record_type,
                        IssueStage::Page { page: page_index },
                        &err,
                        progress,
                        issues,
                    )?;
                    break;
                }
            };
            self.cancel.check()?;

            let next = page.cursor.clone();
            let added =
                self.absorb(record_type, page, page_index, &mut ids, &mut seen, progress, issues)?;
            debug!(
                record_type = %record_type,
                page = page_index,
                added,
                total = ids.len(),
                "fetched continuation page"
            );
            if added == 0 {
                break;
            }
            cursor = next;
            page_index += 1;
        }

        if ids.len() > self.pagination_cap {
            ids.truncate(self.pagination_cap);
            truncated = true;
        }
        if truncated {
            warn!(
                record_type = %record_type,
                cap = self.pagination_cap,
                "pagination stopped at safety cap; remaining records were not deleted"
            );
        }
        Ok(Collected { ids, truncated })
    }

    /// Append new identifiers from `page`; returns how many were new.
    #[allow(clippy::too_many_arguments)]
    fn absorb(
        &self,
        record_type: RecordType,
        page: RemotePage,
        page_index: usize,
        ids: &mut Vec<RecordId>,
        seen: &mut HashSet<RecordId>,
        progress: &PhaseProgress<'_>,
        issues: &mut Vec<DeletionIssue>,
    ) -> Result<usize, DeletionError> {
        let before = ids.len();
        for entry in page.records {
            match entry {
                Ok(id) => {
                    if seen.insert(id.clone()) {
                        ids.push(id);
                    }
                }
                Err(err) => {
                    self.metrics.increment(Counter::RemoteRecordFailures, 1);
                    self.record_failure(
                        record_type,
                        IssueStage::Page { page: page_index },
                        &err,
                        progress,
                        issues,
                    )?;
                }
            }
        }
        Ok(ids.len() - before)
    }

    async fn delete_in_batches(
        &self,
        record_type: RecordType,
        ids: &[RecordId],
        progress: &PhaseProgress<'_>,
        issues: &mut Vec<DeletionIssue>,
    ) -> Result<u64, DeletionError> {
        let batches: Vec<&[RecordId]> = ids.chunks(self.batch_size).collect();
        let total = batches.len();
        let mut deleted = 0u64;

        for (index, batch) in batches.into_iter().enumerate() {
            if index > 0 && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }
            self.cancel.check()?;
            self.metrics.increment(Counter::RemoteBatches, 1);

            match self.store.delete_batch(record_type, batch).await {
                Ok(outcome) => {
                    let requested: HashSet<&RecordId> = batch.iter().collect();
                    let confirmed = outcome
                        .deleted
                        .iter()
                        .filter(|id| requested.contains(id))
                        .count() as u64;
                    for (id, err) in &outcome.failed {
                        self.metrics.increment(Counter::RemoteRecordFailures, 1);
                        self.record_failure(
                            record_type,
                            IssueStage::Record { id: id.clone() },
                            err,
                            progress,
                            issues,
                        )?;
                    }
                    deleted += confirmed;
                    progress.deleted(confirmed);
                    self.metrics
                        .increment(Counter::RecordsDeletedRemote, confirmed);
                    debug!(
                        record_type = %record_type,
                        batch = index,
                        size = batch.len(),
                        confirmed,
                        "remote batch deleted"
                    );
                }
                Err(err) => {
                    self.metrics.increment(Counter::RemoteBatchFailures, 1);
                    self.record_failure(
                        record_type,
                        IssueStage::Batch {
                            index,
                            size: batch.len(),
                        },
                        &err,
                        progress,
                        issues,
                    )?;
                }
            }

            self.cancel.check()?;
            progress.report((index + 1) as f64 / total as f64);
        }

        Ok(deleted)
    }

    /// Translate and either record the failure or escalate it when fatal.
    fn record_failure(
        &self,
        record_type: RecordType,
        stage: IssueStage,
        err: &RemoteError,
        progress: &PhaseProgress<'_>,
        issues: &mut Vec<DeletionIssue>,
    ) -> Result<(), DeletionError> {
        let translated = translate_remote(err);
        if translated.aborts_remote_phase() {
            warn!(
                record_type = %record_type,
                stage = %stage,
                error = %err,
                "remote failure aborts the operation"
            );
            return Err(translated);
        }
        warn!(
            record_type = %record_type,
            stage = %stage,
            error = %err,
            "remote failure recorded; continuing"
        );
        let issue = DeletionIssue::new(record_type, stage, translated);
        progress.issue(&issue);
        issues.push(issue);
        Ok(())
    }
}
