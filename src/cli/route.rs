//! CLI route: single route table and run context. Dispatches to the
//! coordinator and the stores, then to presentation.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::baseline::SledBaselineStore;
use crate::cli::help::{command_name, confirmation_prompt, deletion_target};
use crate::cli::parse::Commands;
use crate::cli::presentation::{
    format_config, format_deletion_result, format_progress_event, format_status, StatusReport,
};
use crate::config::{ConfigLoader, ErasureConfig};
use crate::coordinator::{AutoConfirm, ConfirmationGate, DeletionCoordinator};
use crate::error::DeletionError;
use crate::local::{LocalStore, SledLocalStore};
use crate::remote::HttpRemoteStore;
use crate::telemetry::TracingMetrics;
use crate::types::{DeletionScope, RecordType};

/// Runtime context for CLI execution: workspace, loaded config and the local stores.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ErasureConfig,
    store_path: PathBuf,
    local: SledLocalStore,
    baseline: SledBaselineStore,
    assume_yes: bool,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        assume_yes: bool,
    ) -> Result<Self, DeletionError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };

        let store_path = config.storage.resolve_store_path(&workspace_root);
        std::fs::create_dir_all(&store_path).map_err(|e| {
            DeletionError::LocalStore(format!(
                "Failed to create store directory {}: {}",
                store_path.display(),
                e
            ))
        })?;
        let local = SledLocalStore::open(&store_path)?;
        let baseline = SledBaselineStore::new(local.db())?;
        debug!(store_path = %store_path.display(), "local store opened");

        Ok(Self {
            workspace_root,
            config,
            store_path,
            local,
            baseline,
            assume_yes,
        })
    }

    pub fn config(&self) -> &ErasureConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, DeletionError> {
        info!(command = command_name(command), "executing command");
        if let Some((scope, format)) = deletion_target(command) {
            return self.handle_deletion(scope, format);
        }
        match command {
            Commands::Status { format } => self.handle_status(format),
            Commands::Config { validate } => self.handle_config(*validate),
            _ => Err(DeletionError::InvalidScope(format!(
                "unrouted command {}",
                command_name(command)
            ))),
        }
    }

    fn handle_deletion(&self, scope: DeletionScope, format: &str) -> Result<String, DeletionError> {
        self.config.deletion.validate().map_err(DeletionError::Config)?;
        let remote = HttpRemoteStore::new(&self.config.remote)?;
        let coordinator = DeletionCoordinator::new(
            Arc::new(remote),
            Arc::new(self.local.clone()),
            Arc::new(self.baseline.clone()),
        )
        .with_settings(self.config.deletion.clone())
        .with_metrics(Arc::new(TracingMetrics));

        let events = coordinator.subscribe();
        let event_format = format.to_string();
        let printer = thread::spawn(move || {
            for event in events.iter() {
                if let Some(line) = format_progress_event(&event, &event_format) {
                    eprintln!("{}", line);
                }
                if event.kind.is_terminal() {
                    break;
                }
            }
        });

        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| DeletionError::Config(format!("Failed to create async runtime: {}", e)))?;
        let gate: Box<dyn ConfirmationGate> = if self.assume_yes {
            Box::new(AutoConfirm)
        } else {
            Box::new(TerminalGate)
        };
        let outcome = runtime.block_on(coordinator.delete_all(scope, Some(gate.as_ref())));

        // Dropping the coordinator closes the event stream if no terminal event was sent.
        drop(coordinator);
        let _ = printer.join();

        let result = outcome?;
        Ok(format_deletion_result(&scope, &result, format))
    }

    fn handle_status(&self, format: &str) -> Result<String, DeletionError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| DeletionError::Config(format!("Failed to create async runtime: {}", e)))?;
        let local_counts = runtime.block_on(async {
            let mut counts = Vec::with_capacity(RecordType::ALL.len());
            for record_type in RecordType::ALL {
                counts.push((record_type, self.local.count(record_type).await?));
            }
            Ok::<_, DeletionError>(counts)
        })?;

        let report = StatusReport {
            store_path: self.store_path.clone(),
            local_counts,
            baseline: self.baseline.load()?,
            remote_endpoint: self.config.remote.endpoint.clone(),
            remote_zone: self.config.remote.zone.clone(),
        };
        Ok(format_status(&report, format))
    }

    fn handle_config(&self, validate: bool) -> Result<String, DeletionError> {
        let problems = self.config.validate().err().unwrap_or_default();
        if validate && !problems.is_empty() {
            let lines: Vec<String> = problems.iter().map(|p| p.to_string()).collect();
            return Err(DeletionError::Config(format!(
                "Configuration validation failed:\n{}",
                lines.join("\n")
            )));
        }
        if validate {
            return Ok("Configuration is valid.".to_string());
        }
        Ok(format_config(&self.config, &problems))
    }
}

/// Interactive yes/no prompt on the controlling terminal.
struct TerminalGate;

#[async_trait]
impl ConfirmationGate for TerminalGate {
    async fn confirm(&self, scope: &DeletionScope) -> bool {
        let prompt = confirmation_prompt(scope);
        let answer = tokio::task::spawn_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await;
        matches!(answer, Ok(Ok(true)))
    }
}
