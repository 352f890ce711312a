//! Sled-backed local store.
//!
//! One tree per record type. Keys are the entity timestamp (order-preserving
//! big-endian encoding) followed by the entity id, so date predicates become
//! range scans. Values are bincode-encoded [`LocalEntity`].

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::LocalStoreError;
use crate::local::{EntityKey, LocalEntity, LocalStore};
use crate::types::{Predicate, RecordType};

#[derive(Clone)]
pub struct SledLocalStore {
    db: sled::Db,
}

impl SledLocalStore {
    /// Open (or create) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LocalStoreError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Throwaway store that is removed when dropped.
    pub fn temporary() -> Result<Self, LocalStoreError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }

    /// Underlying database, shared with the baseline store.
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    fn tree(&self, record_type: RecordType) -> Result<sled::Tree, LocalStoreError> {
        Ok(self.db.open_tree(record_type.local_tree())?)
    }

    pub fn insert(&self, record_type: RecordType, entity: &LocalEntity) -> Result<(), LocalStoreError> {
        let key = entity_key(entity.timestamp, entity.id.as_str());
        let value = bincode::serialize(entity)?;
        self.tree(record_type)?.insert(key, value)?;
        Ok(())
    }

    /// Insert `count` entities named `{prefix}-{n}` with the given timestamp.
    pub fn seed(
        &self,
        record_type: RecordType,
        prefix: &str,
        count: usize,
        timestamp: DateTime<Utc>,
    ) -> Result<(), LocalStoreError> {
        let tree = self.tree(record_type)?;
        let mut batch = sled::Batch::default();
        for n in 0..count {
            let entity = LocalEntity::new(format!("{prefix}-{n:06}"), timestamp, Vec::new());
            batch.insert(
                entity_key(entity.timestamp, entity.id.as_str()),
                bincode::serialize(&entity)?,
            );
        }
        tree.apply_batch(batch)?;
        Ok(())
    }

    /// Every entity of `record_type`, oldest first.
    pub fn entities(&self, record_type: RecordType) -> Result<Vec<LocalEntity>, LocalStoreError> {
        self.tree(record_type)?
            .iter()
            .values()
            .map(|value| -> Result<LocalEntity, LocalStoreError> {
                Ok(bincode::deserialize(&value?)?)
            })
            .collect()
    }
}

/// Map a signed timestamp onto bytes whose lexicographic order matches numeric order.
fn timestamp_prefix(millis: i64) -> [u8; 8] {
    ((millis as u64) ^ (1 << 63)).to_be_bytes()
}

fn entity_key(millis: i64, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + id.len());
    key.extend_from_slice(&timestamp_prefix(millis));
    key.extend_from_slice(id.as_bytes());
    key
}

#[async_trait]
impl LocalStore for SledLocalStore {
    async fn fetch(
        &self,
        record_type: RecordType,
        predicate: &Predicate,
    ) -> Result<Vec<EntityKey>, LocalStoreError> {
        let tree = self.tree(record_type)?;
        let predicate = predicate.at_millisecond_precision();
        let iter = match predicate {
            Predicate::All => tree.iter(),
            Predicate::Before { cutoff } => {
                tree.range(..timestamp_prefix(cutoff.timestamp_millis()).to_vec())
            }
            Predicate::InRange { start, end } => tree.range(
                timestamp_prefix(start.timestamp_millis()).to_vec()
                    ..timestamp_prefix(end.timestamp_millis()).to_vec(),
            ),
        };

        let mut keys = Vec::new();
        for item in iter {
            let (key, value) = item?;
            let entity: LocalEntity = bincode::deserialize(&value)?;
            // Range bounds are exact; a mismatch means the key and value disagree.
            if !predicate.matches(entity.timestamp()) {
                return Err(LocalStoreError::Corruption(format!(
                    "entity {} stored under a key outside its timestamp",
                    entity.id
                )));
            }
            keys.push(EntityKey::new(key.to_vec()));
        }
        debug!(record_type = %record_type, matched = keys.len(), "local fetch");
        Ok(keys)
    }

    async fn commit_deletions(
        &self,
        record_type: RecordType,
        keys: &[EntityKey],
    ) -> Result<u64, LocalStoreError> {
        let tree = self.tree(record_type)?;
        let mut batch = sled::Batch::default();
        for key in keys {
            batch.remove(key.as_bytes());
        }
        tree.apply_batch(batch)?;
        tree.flush_async().await?;
        Ok(keys.len() as u64)
    }

    async fn count(&self, record_type: RecordType) -> Result<u64, LocalStoreError> {
        Ok(self.tree(record_type)?.len() as u64)
    }
}
