//! Event schema for deletion progress.

use serde::{Deserialize, Serialize};

use crate::types::RecordType;

/// Coarse phase of a deletion operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Remote,
    Local,
    BaselineReset,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Remote => "remote",
            Phase::Local => "local",
            Phase::BaselineReset => "baseline_reset",
        }
    }
}

/// Read-only snapshot of the running operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletionProgress {
    pub in_progress: bool,
    pub fraction: f64,
    pub current_step: String,
    pub records_deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub ts: String,
    pub operation: String,
    pub seq: u64,
    #[serde(flatten)]
    pub kind: ProgressEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEventKind {
    AwaitingConfirmation {
        scope: String,
    },
    OperationStarted {
        scope: String,
    },
    PhaseStarted {
        phase: Phase,
        #[serde(skip_serializing_if = "Option::is_none")]
        record_type: Option<RecordType>,
        description: String,
        lo: f64,
        hi: f64,
    },
    Progress {
        phase: Phase,
        fraction: f64,
        records_deleted: u64,
    },
    IssueRecorded {
        record_type: RecordType,
        stage: String,
        code: String,
        message: String,
    },
    OperationCompleted {
        records_deleted_remote: u64,
        records_deleted_local: u64,
        issues: usize,
    },
    OperationFailed {
        code: String,
        message: String,
    },
    OperationCancelled,
}

impl ProgressEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProgressEventKind::AwaitingConfirmation { .. } => "awaiting_confirmation",
            ProgressEventKind::OperationStarted { .. } => "operation_started",
            ProgressEventKind::PhaseStarted { .. } => "phase_started",
            ProgressEventKind::Progress { .. } => "progress",
            ProgressEventKind::IssueRecorded { .. } => "issue_recorded",
            ProgressEventKind::OperationCompleted { .. } => "operation_completed",
            ProgressEventKind::OperationFailed { .. } => "operation_failed",
            ProgressEventKind::OperationCancelled => "operation_cancelled",
        }
    }

    /// Whether this event closes an operation's stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEventKind::OperationCompleted { .. }
                | ProgressEventKind::OperationFailed { .. }
                | ProgressEventKind::OperationCancelled
        )
    }
}

impl ProgressEvent {
    pub fn fraction(&self) -> Option<f64> {
        match &self.kind {
            ProgressEventKind::Progress { fraction, .. } => Some(*fraction),
            _ => None,
        }
    }
}
