//! In-process remote record store.
//!
//! Behaves like the real store (pagination with cursors, non-atomic batch
//! deletes bounded by [`MAX_BATCH_SIZE`]) and can be scripted to fail, which
//! makes it the target for offline simulation and for exercising the deleter.

use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::{RemoteError, RemoteErrorCode};
use crate::remote::{
    BatchDeleteOutcome, DesiredKeys, RecordQuery, RemotePage, RemoteRecordStore, MAX_BATCH_SIZE,
};
use crate::types::{Cursor, RecordId, RecordType};

const DEFAULT_PAGE_SIZE: usize = 200;

/// Calls observed by the store, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Query {
        record_type: RecordType,
        desired_keys: DesiredKeys,
    },
    Continue {
        record_type: RecordType,
        desired_keys: DesiredKeys,
    },
    Delete {
        record_type: RecordType,
        size: usize,
    },
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<RecordType, BTreeMap<RecordId, DateTime<Utc>>>,
    calls: Vec<RemoteCall>,
    query_failures: VecDeque<RemoteError>,
    continuation_failures: VecDeque<RemoteError>,
    delete_failures: HashMap<usize, RemoteError>,
    record_failures: HashMap<RecordId, RemoteError>,
    delete_calls: usize,
    endless: bool,
    synthetic_seq: u64,
}

pub struct InMemoryRemoteStore {
    inner: Mutex<Inner>,
    page_size: usize,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            page_size: page_size.max(1),
        }
    }

    pub fn insert(&self, record_type: RecordType, id: impl Into<RecordId>, timestamp: DateTime<Utc>) {
        self.inner
            .lock()
            .records
            .entry(record_type)
            .or_default()
            .insert(id.into(), timestamp);
    }

    /// Insert `count` records named `{prefix}-{n}` with the given timestamp.
    pub fn seed(&self, record_type: RecordType, prefix: &str, count: usize, timestamp: DateTime<Utc>) {
        let mut inner = self.inner.lock();
        let records = inner.records.entry(record_type).or_default();
        for n in 0..count {
            records.insert(RecordId::new(format!("{prefix}-{n:06}")), timestamp);
        }
    }

    pub fn count(&self, record_type: RecordType) -> usize {
        self.inner
            .lock()
            .records
            .get(&record_type)
            .map(|r| r.len())
            .unwrap_or(0)
    }

    pub fn timestamps(&self, record_type: RecordType) -> Vec<DateTime<Utc>> {
        self.inner
            .lock()
            .records
            .get(&record_type)
            .map(|r| r.values().copied().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.inner.lock().calls.clone()
    }

    /// Sizes of every delete request, in order.
    pub fn delete_sizes(&self) -> Vec<usize> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                RemoteCall::Delete { size, .. } => Some(*size),
                _ => None,
            })
            .collect()
    }

    /// Fail the next initial query with `err`.
    pub fn fail_next_query(&self, err: RemoteError) {
        self.inner.lock().query_failures.push_back(err);
    }

    pub fn fail_next_continuation(&self, err: RemoteError) {
        self.inner.lock().continuation_failures.push_back(err);
    }

    /// Fail the delete request with zero-based ordinal `call` (across all types).
    pub fn fail_delete_call(&self, call: usize, err: RemoteError) {
        self.inner.lock().delete_failures.insert(call, err);
    }

    /// Reject deletion of one record inside an otherwise successful batch.
    pub fn fail_record(&self, id: impl Into<RecordId>, err: RemoteError) {
        self.inner.lock().record_failures.insert(id.into(), err);
    }

    /// Make every continuation return a full page of fresh identifiers and
    /// another cursor, like a server that never finishes.
    pub fn set_endless(&self, endless: bool) {
        self.inner.lock().endless = endless;
    }

    fn page_from(&self, inner: &mut Inner, query: &RecordQuery, offset: usize) -> RemotePage {
        if inner.endless && offset > 0 {
            let records = (0..self.page_size)
                .map(|_| {
                    inner.synthetic_seq += 1;
                    Ok(RecordId::new(format!("synthetic-{}", inner.synthetic_seq)))
                })
                .collect();
            return RemotePage {
                records,
                cursor: Some(encode_cursor(query.record_type, offset + self.page_size)),
            };
        }

        let matching: Vec<RecordId> = inner
            .records
            .get(&query.record_type)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, ts)| query.predicate.matches(**ts))
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default();

        let end = (offset + self.page_size).min(matching.len());
        let records = matching
            .get(offset..end)
            .unwrap_or(&[])
            .iter()
            .cloned()
            .map(Ok)
            .collect();
        let cursor = if end < matching.len() || inner.endless {
            Some(encode_cursor(query.record_type, end))
        } else {
            None
        };
        RemotePage { records, cursor }
    }
}

fn encode_cursor(record_type: RecordType, offset: usize) -> Cursor {
    Cursor::new(format!("{}:{}", record_type.as_str(), offset))
}

fn decode_cursor(record_type: RecordType, cursor: &Cursor) -> Result<usize, RemoteError> {
    let invalid = || RemoteError::new(RemoteErrorCode::BadRequest, "invalid continuation marker");
    let (kind, offset) = cursor.token().split_once(':').ok_or_else(invalid)?;
    if kind != record_type.as_str() {
        return Err(invalid());
    }
    offset.parse().map_err(|_| invalid())
}

#[async_trait]
impl RemoteRecordStore for InMemoryRemoteStore {
    async fn query(&self, query: &RecordQuery) -> Result<RemotePage, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Query {
            record_type: query.record_type,
            desired_keys: query.desired_keys,
        });
        if let Some(err) = inner.query_failures.pop_front() {
            return Err(err);
        }
        Ok(self.page_from(&mut inner, query, 0))
    }

    async fn continue_query(
        &self,
        query: &RecordQuery,
        cursor: &Cursor,
    ) -> Result<RemotePage, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Continue {
            record_type: query.record_type,
            desired_keys: query.desired_keys,
        });
        if let Some(err) = inner.continuation_failures.pop_front() {
            return Err(err);
        }
        let offset = decode_cursor(query.record_type, cursor)?;
        Ok(self.page_from(&mut inner, query, offset))
    }

    async fn delete_batch(
        &self,
        record_type: RecordType,
        ids: &[RecordId],
    ) -> Result<BatchDeleteOutcome, RemoteError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RemoteCall::Delete {
            record_type,
            size: ids.len(),
        });
        let call = inner.delete_calls;
        inner.delete_calls += 1;

        if ids.len() > MAX_BATCH_SIZE {
            return Err(RemoteError::new(
                RemoteErrorCode::LimitExceeded,
                format!("batch of {} exceeds limit {}", ids.len(), MAX_BATCH_SIZE),
            ));
        }
        if let Some(err) = inner.delete_failures.remove(&call) {
            return Err(err);
        }

        let mut outcome = BatchDeleteOutcome::default();
        for id in ids {
            if let Some(err) = inner.record_failures.get(id).cloned() {
                outcome.failed.push((id.clone(), err));
                continue;
            }
            let removed = inner
                .records
                .get_mut(&record_type)
                .and_then(|records| records.remove(id))
                .is_some();
            if removed || id.as_str().starts_with("synthetic-") {
                outcome.deleted.push(id.clone());
            } else {
                outcome.failed.push((
                    id.clone(),
                    RemoteError::new(RemoteErrorCode::UnknownItem, "record does not exist"),
                ));
            }
        }
        Ok(outcome)
    }
}
