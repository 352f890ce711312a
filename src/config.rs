//! Configuration System
//!
//! Layered configuration for deletion behaviour, the remote record store, the
//! local store location and logging. Built-in defaults are overridden by the
//! global file, then the workspace files, then `ERASURE_*` environment
//! variables.

use crate::logging::LoggingConfig;
use crate::remote::MAX_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErasureConfig {
    #[serde(default)]
    pub deletion: DeletionConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Batching, pacing and progress granularity of deletion runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionConfig {
    /// Records per remote delete request (at most 300)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive remote delete requests
    #[serde(default = "default_inter_batch_delay_ms")]
    pub inter_batch_delay_ms: u64,

    /// Upper bound on identifiers collected per record type
    #[serde(default = "default_pagination_cap")]
    pub pagination_cap: usize,

    /// Fraction of local entities between progress reports
    #[serde(default = "default_local_progress_step")]
    pub local_progress_step: f64,
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_inter_batch_delay_ms() -> u64 {
    100
}

fn default_pagination_cap() -> usize {
    10_000
}

fn default_local_progress_step() -> f64 {
    0.1
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            inter_batch_delay_ms: default_inter_batch_delay_ms(),
            pagination_cap: default_pagination_cap(),
            local_progress_step: default_local_progress_step(),
        }
    }
}

impl DeletionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(format!(
                "batch_size must be between 1 and {} (got {})",
                MAX_BATCH_SIZE, self.batch_size
            ));
        }
        if self.pagination_cap == 0 {
            return Err("pagination_cap must be at least 1".to_string());
        }
        if !(self.local_progress_step > 0.0 && self.local_progress_step <= 1.0) {
            return Err(format!(
                "local_progress_step must be in (0, 1] (got {})",
                self.local_progress_step
            ));
        }
        Ok(())
    }
}

/// Remote record store connection settings
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the web service; the HTTP store is unavailable without it
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_container")]
    pub container: String,

    /// `development` or `production`
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Database scope: private, shared or public
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_zone")]
    pub zone: String,

    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Results requested per query page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_container() -> String {
    "iCloud.com.stresslens.app".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_database() -> String {
    "private".to_string()
}

fn default_zone() -> String {
    "_defaultZone".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    200
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            container: default_container(),
            environment: default_environment(),
            database: default_database(),
            zone: default_zone(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("container", &self.container)
            .field("environment", &self.environment)
            .field("database", &self.database)
            .field("zone", &self.zone)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("page_size", &self.page_size)
            .finish()
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!("endpoint must be an http(s) URL (got {})", endpoint));
            }
        }
        if self.container.trim().is_empty() {
            return Err("container cannot be empty".to_string());
        }
        if !matches!(self.environment.as_str(), "development" | "production") {
            return Err(format!(
                "environment must be 'development' or 'production' (got {})",
                self.environment
            ));
        }
        if !matches!(self.database.as_str(), "private" | "shared" | "public") {
            return Err(format!(
                "database must be 'private', 'shared' or 'public' (got {})",
                self.database
            ));
        }
        if self.zone.trim().is_empty() {
            return Err("zone cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be at least 1".to_string());
        }
        if self.page_size == 0 {
            return Err("page_size must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Local store location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory; relative paths resolve against the workspace
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".erasure/store")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

impl StorageConfig {
    pub fn resolve_store_path(&self, workspace_root: &Path) -> PathBuf {
        if self.store_path.is_absolute() {
            self.store_path.clone()
        } else {
            workspace_root.join(&self.store_path)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Deletion(String),
    Remote(String),
    Storage(String),
    Logging(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Deletion(msg) => write!(f, "deletion: {}", msg),
            ValidationError::Remote(msg) => write!(f, "remote: {}", msg),
            ValidationError::Storage(msg) => write!(f, "storage: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ErasureConfig {
    /// Validate every section, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.deletion.validate() {
            errors.push(ValidationError::Deletion(e));
        }
        if let Err(e) = self.remote.validate() {
            errors.push(ValidationError::Remote(e));
        }
        if self.storage.store_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage(
                "store_path cannot be empty".to_string(),
            ));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
