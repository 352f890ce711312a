//! Deletion presentation: result summary and streamed progress lines.

use comfy_table::Table;
use serde_json::json;

use crate::progress::{ProgressEvent, ProgressEventKind};
use crate::report::DeletionResult;
use crate::types::DeletionScope;

pub fn format_deletion_result(scope: &DeletionScope, result: &DeletionResult, format: &str) -> String {
    if format == "json" {
        let issues: Vec<_> = result
            .errors
            .iter()
            .map(|issue| {
                json!({
                    "record_type": issue.record_type,
                    "stage": issue.stage,
                    "code": issue.error.code(),
                    "message": issue.error.to_string(),
                })
            })
            .collect();
        let out = json!({
            "scope": scope,
            "records_deleted_remote": result.records_deleted_remote,
            "records_deleted_local": result.records_deleted_local,
            "total_deleted": result.total_deleted(),
            "baseline_reset": result.baseline_reset,
            "truncated": result.truncated,
            "issues": issues,
        });
        return serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Store", "Deleted"]);
    table.add_row(vec!["remote".to_string(), result.records_deleted_remote.to_string()]);
    table.add_row(vec!["local".to_string(), result.records_deleted_local.to_string()]);
    table.add_row(vec!["total".to_string(), result.total_deleted().to_string()]);

    let mut out = format!("Deleted {}\n{}", scope, table);
    if result.baseline_reset {
        out.push_str("\nPersonal baseline reset to default.");
    }
    if !result.truncated.is_empty() {
        let types: Vec<String> = result.truncated.iter().map(|t| t.to_string()).collect();
        out.push_str(&format!(
            "\nStopped at the pagination limit for: {}. Run the command again to delete the rest.",
            types.join(", ")
        ));
    }
    if !result.errors.is_empty() {
        out.push_str(&format!("\n\nIssues ({}):", result.errors.len()));
        for issue in &result.errors {
            out.push_str(&format!("\n  - {}", issue));
        }
    }
    out
}

/// One stderr line for `event`, or `None` for events not worth showing.
pub fn format_progress_event(event: &ProgressEvent, format: &str) -> Option<String> {
    if format == "json" {
        return serde_json::to_string(event).ok();
    }
    match &event.kind {
        ProgressEventKind::AwaitingConfirmation { .. } => None,
        ProgressEventKind::OperationStarted { scope } => Some(format!("Deleting {}", scope)),
        ProgressEventKind::PhaseStarted { description, .. } => Some(format!("  {}", description)),
        ProgressEventKind::Progress {
            fraction,
            records_deleted,
            ..
        } => Some(format!(
            "  [{:>5.1}%] {} records deleted",
            fraction * 100.0,
            records_deleted
        )),
        ProgressEventKind::IssueRecorded {
            record_type,
            stage,
            message,
            ..
        } => Some(format!("  ! {} {}: {}", record_type, stage, message)),
        ProgressEventKind::OperationCompleted { .. } => Some("Done.".to_string()),
        ProgressEventKind::OperationFailed { message, .. } => Some(format!("Failed: {}", message)),
        ProgressEventKind::OperationCancelled => Some("Cancelled.".to_string()),
    }
}
