//! Operation outcome types: the summary returned to callers and the non-fatal
//! issues collected along the way.

use serde::Serialize;
use std::fmt;

use crate::error::DeletionError;
use crate::types::{RecordId, RecordType};

/// Where in the remote or local phase an issue was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum IssueStage {
    /// Initial query for a record type.
    Query,
    /// Continuation query for a further page.
    Page { page: usize },
    /// One bulk delete request.
    Batch { index: usize, size: usize },
    /// One record inside a page or a batch.
    Record { id: RecordId },
}

impl fmt::Display for IssueStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStage::Query => f.write_str("query"),
            IssueStage::Page { page } => write!(f, "page {}", page),
            IssueStage::Batch { index, size } => write!(f, "batch {} ({} records)", index, size),
            IssueStage::Record { id } => write!(f, "record {}", id),
        }
    }
}

/// A non-fatal failure recorded while the operation kept going.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionIssue {
    pub record_type: RecordType,
    pub stage: IssueStage,
    pub error: DeletionError,
}

impl DeletionIssue {
    pub fn new(record_type: RecordType, stage: IssueStage, error: DeletionError) -> Self {
        Self {
            record_type,
            stage,
            error,
        }
    }
}

impl fmt::Display for DeletionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.record_type, self.stage, self.error)
    }
}

/// Summary of a finished deletion operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionResult {
    pub records_deleted_remote: u64,
    pub records_deleted_local: u64,
    pub errors: Vec<DeletionIssue>,
    /// Record types whose remote pagination stopped at the safety cap.
    pub truncated: Vec<RecordType>,
    pub baseline_reset: bool,
}

impl DeletionResult {
    pub fn total_deleted(&self) -> u64 {
        self.records_deleted_remote + self.records_deleted_local
    }

    /// True when nothing was skipped or left behind.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.truncated.is_empty()
    }
}
