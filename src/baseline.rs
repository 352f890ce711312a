//! Personal baseline: derived state recomputed from measurements.
//!
//! Once the measurements behind it are gone the baseline is meaningless, so
//! deletions finish by resetting it to the population default.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LocalStoreError;

const BASELINE_TREE: &str = "baseline_state";
const BASELINE_KEY: &[u8] = b"current";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalBaseline {
    pub resting_hrv_ms: f64,
    pub resting_heart_rate_bpm: f64,
    pub sample_count: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for PersonalBaseline {
    fn default() -> Self {
        Self {
            resting_hrv_ms: 50.0,
            resting_heart_rate_bpm: 60.0,
            sample_count: 0,
            updated_at: None,
        }
    }
}

impl PersonalBaseline {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[async_trait]
pub trait BaselineResetter: Send + Sync {
    async fn reset_to_default(&self) -> Result<(), LocalStoreError>;
}

/// Baseline persisted as JSON in its own sled tree.
#[derive(Clone)]
pub struct SledBaselineStore {
    tree: sled::Tree,
}

impl SledBaselineStore {
    pub fn new(db: &sled::Db) -> Result<Self, LocalStoreError> {
        Ok(Self {
            tree: db.open_tree(BASELINE_TREE)?,
        })
    }

    /// Stored baseline, or the default when none was ever saved.
    pub fn load(&self) -> Result<PersonalBaseline, LocalStoreError> {
        match self.tree.get(BASELINE_KEY)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(PersonalBaseline::default()),
        }
    }

    pub fn save(&self, baseline: &PersonalBaseline) -> Result<(), LocalStoreError> {
        self.tree.insert(BASELINE_KEY, serde_json::to_vec(baseline)?)?;
        Ok(())
    }
}

#[async_trait]
impl BaselineResetter for SledBaselineStore {
    async fn reset_to_default(&self) -> Result<(), LocalStoreError> {
        self.save(&PersonalBaseline::default())?;
        self.tree.flush_async().await?;
        info!("personal baseline reset to default");
        Ok(())
    }
}
