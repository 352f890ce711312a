//! Shared test utilities for integration tests
//!
//! Builds coordinators over in-memory and temporary stores, and isolates the
//! XDG environment for configuration tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use erasure::baseline::{BaselineResetter, PersonalBaseline, SledBaselineStore};
use erasure::config::DeletionConfig;
use erasure::coordinator::{ConfirmationGate, DeletionCoordinator};
use erasure::error::LocalStoreError;
use erasure::local::{EntityKey, LocalStore, SledLocalStore};
use erasure::remote::InMemoryRemoteStore;
use erasure::telemetry::InMemoryMetrics;
use erasure::types::{DeletionScope, Predicate, RecordType};

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

struct EnvState {
    home: Option<String>,
    xdg_config_home: Option<String>,
    xdg_data_home: Option<String>,
}

impl EnvState {
    fn capture() -> Self {
        Self {
            home: std::env::var("HOME").ok(),
            xdg_config_home: std::env::var("XDG_CONFIG_HOME").ok(),
            xdg_data_home: std::env::var("XDG_DATA_HOME").ok(),
        }
    }

    fn restore(self) {
        for (key, value) in [
            ("HOME", self.home),
            ("XDG_CONFIG_HOME", self.xdg_config_home),
            ("XDG_DATA_HOME", self.xdg_data_home),
        ] {
            match value {
                Some(orig) => std::env::set_var(key, orig),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// Run `f` with HOME and the XDG directories pointing inside `test_dir`.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_config_home = test_dir.path().join("config-home");
    let test_data_home = test_dir.path().join("data");
    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_config_home).unwrap();
    std::fs::create_dir_all(&test_data_home).unwrap();
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", &test_config_home);
    std::env::set_var("XDG_DATA_HOME", &test_data_home);

    let result = f();
    env_state.restore();
    result
}

pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, n, 9, 0, 0).unwrap()
}

/// Deletion settings without pacing so tests run at full speed.
pub fn fast_settings() -> DeletionConfig {
    DeletionConfig {
        inter_batch_delay_ms: 0,
        ..DeletionConfig::default()
    }
}

/// Coordinator over an in-memory remote store and temporary sled stores.
pub struct Harness {
    pub remote: Arc<InMemoryRemoteStore>,
    pub local: Arc<SledLocalStore>,
    pub baseline: Arc<SledBaselineStore>,
    pub metrics: Arc<InMemoryMetrics>,
    pub coordinator: DeletionCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(fast_settings())
    }

    pub fn with_settings(settings: DeletionConfig) -> Self {
        Self::build(Arc::new(InMemoryRemoteStore::new()), settings)
    }

    pub fn build(remote: Arc<InMemoryRemoteStore>, settings: DeletionConfig) -> Self {
        let local = Arc::new(SledLocalStore::temporary().unwrap());
        let baseline = Arc::new(SledBaselineStore::new(local.db()).unwrap());
        let metrics = Arc::new(InMemoryMetrics::new());
        let coordinator = DeletionCoordinator::new(remote.clone(), local.clone(), baseline.clone())
            .with_settings(settings)
            .with_metrics(metrics.clone());
        Self {
            remote,
            local,
            baseline,
            metrics,
            coordinator,
        }
    }

    /// Store a learned (non-default) baseline.
    pub fn learn_baseline(&self) {
        self.baseline
            .save(&PersonalBaseline {
                resting_hrv_ms: 64.0,
                resting_heart_rate_bpm: 57.0,
                sample_count: 90,
                updated_at: Some(day(1)),
            })
            .unwrap();
    }

    pub async fn local_count(&self, record_type: RecordType) -> u64 {
        self.local.count(record_type).await.unwrap()
    }
}

/// Gate answering with a fixed value and remembering whether it was asked.
pub struct FixedGate {
    answer: bool,
    asked: AtomicBool,
}

impl FixedGate {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicBool::new(false),
        }
    }

    pub fn was_asked(&self) -> bool {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConfirmationGate for FixedGate {
    async fn confirm(&self, _scope: &DeletionScope) -> bool {
        self.asked.store(true, Ordering::SeqCst);
        self.answer
    }
}

/// Local store whose commit always fails, delegating everything else.
pub struct FailingCommitStore {
    pub inner: SledLocalStore,
}

#[async_trait]
impl LocalStore for FailingCommitStore {
    async fn fetch(
        &self,
        record_type: RecordType,
        predicate: &Predicate,
    ) -> Result<Vec<EntityKey>, LocalStoreError> {
        self.inner.fetch(record_type, predicate).await
    }

    async fn commit_deletions(
        &self,
        _record_type: RecordType,
        _keys: &[EntityKey],
    ) -> Result<u64, LocalStoreError> {
        Err(LocalStoreError::Io("disk full".to_string()))
    }

    async fn count(&self, record_type: RecordType) -> Result<u64, LocalStoreError> {
        self.inner.count(record_type).await
    }
}

/// Baseline resetter that always fails.
pub struct BrokenBaseline;

#[async_trait]
impl BaselineResetter for BrokenBaseline {
    async fn reset_to_default(&self) -> Result<(), LocalStoreError> {
        Err(LocalStoreError::Corruption("baseline tree unreadable".to_string()))
    }
}
