//! CLI parse: clap types for Erasure. No behavior; definitions only.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::RecordType;

/// Erasure CLI - Coordinated deletion of remote and local user data
#[derive(Parser)]
#[command(name = "erasure")]
#[command(about = "Coordinated deletion of user data across the remote record store and the local store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y', default_value = "false")]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Delete every record of one type, or of every type
    DeleteAll {
        /// Record type (measurement, baseline, sync_metadata); all types when omitted
        #[arg(long = "type", value_parser = parse_record_type)]
        record_type: Option<RecordType>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete records strictly older than a date
    DeleteBefore {
        #[arg(long = "type", value_parser = parse_record_type)]
        record_type: RecordType,
        /// Cutoff (RFC 3339 or YYYY-MM-DD, midnight UTC)
        #[arg(long, value_parser = parse_date)]
        before: DateTime<Utc>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete records with start <= timestamp < end
    DeleteInRange {
        #[arg(long = "type", value_parser = parse_record_type)]
        record_type: RecordType,
        #[arg(long, value_parser = parse_date)]
        start: DateTime<Utc>,
        #[arg(long, value_parser = parse_date)]
        end: DateTime<Utc>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete every remote record; local data is kept
    ResetRemote {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Delete all remote and local data and reset the personal baseline
    FactoryReset {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show local record counts, baseline and remote configuration
    Status {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the effective configuration
    Config {
        /// Validate only; print problems and exit non-zero if any
        #[arg(long)]
        validate: bool,
    },
}

pub fn parse_record_type(s: &str) -> Result<RecordType, String> {
    s.parse()
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` taken as midnight UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("Invalid date '{}': expected RFC 3339 or YYYY-MM-DD", s))
}
