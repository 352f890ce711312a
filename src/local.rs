//! Local embedded store capability and the bulk deleter built on it.

pub mod deleter;
pub mod sled_store;

pub use deleter::LocalBulkDeleter;
pub use sled_store::SledLocalStore;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LocalStoreError;
use crate::types::{Predicate, RecordId, RecordType};

/// Entity persisted in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEntity {
    pub id: RecordId,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub payload: Vec<u8>,
}

impl LocalEntity {
    pub fn new(id: impl Into<RecordId>, timestamp: DateTime<Utc>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.timestamp_millis(),
            payload,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.timestamp)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Opaque handle to a fetched entity, valid for the store that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey(Vec<u8>);

impl EntityKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Every entity of `record_type` matching `predicate`.
    async fn fetch(
        &self,
        record_type: RecordType,
        predicate: &Predicate,
    ) -> Result<Vec<EntityKey>, LocalStoreError>;

    /// Delete all `keys` in one save; either every key goes or none does.
    async fn commit_deletions(
        &self,
        record_type: RecordType,
        keys: &[EntityKey],
    ) -> Result<u64, LocalStoreError>;

    async fn count(&self, record_type: RecordType) -> Result<u64, LocalStoreError>;
}
