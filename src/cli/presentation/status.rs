//! Status and config presentation.

use comfy_table::Table;
use serde::Serialize;
use std::path::PathBuf;

use crate::baseline::PersonalBaseline;
use crate::config::{ErasureConfig, ValidationError};
use crate::types::RecordType;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub store_path: PathBuf,
    pub local_counts: Vec<(RecordType, u64)>,
    pub baseline: PersonalBaseline,
    pub remote_endpoint: Option<String>,
    pub remote_zone: String,
}

pub fn format_status(report: &StatusReport, format: &str) -> String {
    if format == "json" {
        return serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
    }

    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Record type", "Local records"]);
    for (record_type, count) in &report.local_counts {
        table.add_row(vec![record_type.to_string(), count.to_string()]);
    }

    let baseline = if report.baseline.is_default() {
        "default".to_string()
    } else {
        format!(
            "learned from {} samples (HRV {:.1} ms, resting HR {:.0} bpm)",
            report.baseline.sample_count,
            report.baseline.resting_hrv_ms,
            report.baseline.resting_heart_rate_bpm
        )
    };
    format!(
        "Local store: {}\n{}\nBaseline: {}\nRemote: {} (zone {})",
        report.store_path.display(),
        table,
        baseline,
        report
            .remote_endpoint
            .as_deref()
            .unwrap_or("(not configured)"),
        report.remote_zone
    )
}

/// Effective configuration as TOML, followed by any validation problems.
pub fn format_config(config: &ErasureConfig, problems: &[ValidationError]) -> String {
    let mut redacted = config.clone();
    if redacted.remote.api_token.is_some() {
        redacted.remote.api_token = Some("<redacted>".to_string());
    }
    let mut out = toml::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("# failed to render configuration: {}\n", e));
    if problems.is_empty() {
        out.push_str("\n# configuration is valid");
    } else {
        out.push_str(&format!("\n# {} problem(s):", problems.len()));
        for problem in problems {
            out.push_str(&format!("\n#   - {}", problem));
        }
    }
    out
}
