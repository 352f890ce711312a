//! Remote record store capability and the bulk deleter built on it.
//!
//! Stores are paginated and rate limited: queries return a finite page plus an
//! optional [`Cursor`], and deletes are accepted in bounded, non-atomic batches.

pub mod deleter;
pub mod http;
pub mod memory;

pub use deleter::{RemoteBulkDeleter, RemoteSweep};
pub use http::HttpRemoteStore;
pub use memory::InMemoryRemoteStore;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::types::{Cursor, Predicate, RecordId, RecordType};

/// Largest batch the remote store accepts in one delete request.
pub const MAX_BATCH_SIZE: usize = 300;

/// Which fields a query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesiredKeys {
    Full,
    /// Identifiers only; used for continuation pages to keep them cheap.
    IdentifiersOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordQuery {
    pub record_type: RecordType,
    pub predicate: Predicate,
    pub desired_keys: DesiredKeys,
}

impl RecordQuery {
    pub fn new(record_type: RecordType, predicate: Predicate) -> Self {
        Self {
            record_type,
            predicate,
            desired_keys: DesiredKeys::Full,
        }
    }

    pub fn identifiers_only(&self) -> Self {
        Self {
            desired_keys: DesiredKeys::IdentifiersOnly,
            ..self.clone()
        }
    }
}

/// One page of query results. Individual records may fail to load.
#[derive(Debug, Clone, Default)]
pub struct RemotePage {
    pub records: Vec<Result<RecordId, RemoteError>>,
    pub cursor: Option<Cursor>,
}

/// Per-record result of a non-atomic delete request.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteOutcome {
    pub deleted: Vec<RecordId>,
    pub failed: Vec<(RecordId, RemoteError)>,
}

#[async_trait]
pub trait RemoteRecordStore: Send + Sync {
    async fn query(&self, query: &RecordQuery) -> Result<RemotePage, RemoteError>;

    async fn continue_query(
        &self,
        query: &RecordQuery,
        cursor: &Cursor,
    ) -> Result<RemotePage, RemoteError>;

    /// Delete up to [`MAX_BATCH_SIZE`] records in one non-atomic request.
    async fn delete_batch(
        &self,
        record_type: RecordType,
        ids: &[RecordId],
    ) -> Result<BatchDeleteOutcome, RemoteError>;
}
