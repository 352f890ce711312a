//! Core domain types: record types, scopes, predicates, identifiers and cursors.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of user data held by both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Measurement,
    Baseline,
    SyncMetadata,
}

impl RecordType {
    /// Every record type, in deletion order.
    pub const ALL: [RecordType; 3] = [
        RecordType::Measurement,
        RecordType::Baseline,
        RecordType::SyncMetadata,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Measurement => "measurement",
            RecordType::Baseline => "baseline",
            RecordType::SyncMetadata => "sync_metadata",
        }
    }

    /// Record type name on the remote record store.
    pub fn remote_name(self) -> &'static str {
        match self {
            RecordType::Measurement => "StressMeasurement",
            RecordType::Baseline => "PersonalBaseline",
            RecordType::SyncMetadata => "SyncMetadata",
        }
    }

    /// Tree holding this type in the local store.
    pub fn local_tree(self) -> &'static str {
        match self {
            RecordType::Measurement => "entities/measurement",
            RecordType::Baseline => "entities/baseline",
            RecordType::SyncMetadata => "entities/sync_metadata",
        }
    }

    /// Relative share of a multi-type phase's progress range.
    pub fn progress_weight(self) -> f64 {
        match self {
            RecordType::Measurement => 12.0,
            RecordType::Baseline => 4.0,
            RecordType::SyncMetadata => 3.0,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "measurement" | "measurements" => Ok(RecordType::Measurement),
            "baseline" | "baselines" => Ok(RecordType::Baseline),
            "sync_metadata" | "syncmetadata" | "metadata" => Ok(RecordType::SyncMetadata),
            other => Err(format!(
                "Unknown record type: {} (expected measurement, baseline or sync_metadata)",
                other
            )),
        }
    }
}

/// Timestamp filter applied to a query against either store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    All,
    /// Strictly earlier than the cutoff.
    Before { cutoff: DateTime<Utc> },
    /// Start inclusive, end exclusive.
    InRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Predicate {
    pub fn matches(&self, timestamp: DateTime<Utc>) -> bool {
        match *self {
            Predicate::All => true,
            Predicate::Before { cutoff } => timestamp < cutoff,
            Predicate::InRange { start, end } => timestamp >= start && timestamp < end,
        }
    }

    /// Round every bound up to the next whole millisecond.
    ///
    /// Both stores keep timestamps at millisecond precision, so for any stored
    /// timestamp the rounded predicate selects exactly what the original does.
    pub fn at_millisecond_precision(&self) -> Predicate {
        match *self {
            Predicate::All => Predicate::All,
            Predicate::Before { cutoff } => Predicate::Before {
                cutoff: ceil_to_millisecond(cutoff),
            },
            Predicate::InRange { start, end } => Predicate::InRange {
                start: ceil_to_millisecond(start),
                end: ceil_to_millisecond(end),
            },
        }
    }

    /// Reject ranges that can never match.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Predicate::InRange { start, end } if start >= end => Err(format!(
                "Range start {} must be earlier than end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )),
            _ => Ok(()),
        }
    }
}

fn ceil_to_millisecond(ts: DateTime<Utc>) -> DateTime<Utc> {
    if ts.timestamp_subsec_nanos() % 1_000_000 == 0 {
        return ts;
    }
    Utc.timestamp_millis_opt(ts.timestamp_millis() + 1)
        .single()
        .unwrap_or(ts)
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All => f.write_str("all"),
            Predicate::Before { cutoff } => write!(f, "before {}", cutoff.to_rfc3339()),
            Predicate::InRange { start, end } => {
                write!(f, "from {} until {}", start.to_rfc3339(), end.to_rfc3339())
            }
        }
    }
}

/// What a single deletion operation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum DeletionScope {
    AllOfType { record_type: RecordType },
    BeforeDate {
        record_type: RecordType,
        cutoff: DateTime<Utc>,
    },
    InRange {
        record_type: RecordType,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    AllTypes,
    RemoteOnlyReset,
    FactoryReset,
}

impl DeletionScope {
    /// Record types touched by this scope.
    pub fn record_types(&self) -> Vec<RecordType> {
        match *self {
            DeletionScope::AllOfType { record_type }
            | DeletionScope::BeforeDate { record_type, .. }
            | DeletionScope::InRange { record_type, .. } => vec![record_type],
            DeletionScope::AllTypes
            | DeletionScope::RemoteOnlyReset
            | DeletionScope::FactoryReset => RecordType::ALL.to_vec(),
        }
    }

    /// Filter both stores apply, at their millisecond precision.
    pub fn predicate(&self) -> Predicate {
        let predicate = match *self {
            DeletionScope::BeforeDate { cutoff, .. } => Predicate::Before { cutoff },
            DeletionScope::InRange { start, end, .. } => Predicate::InRange { start, end },
            _ => Predicate::All,
        };
        predicate.at_millisecond_precision()
    }

    pub fn includes_local(&self) -> bool {
        !matches!(self, DeletionScope::RemoteOnlyReset)
    }

    pub fn resets_baseline(&self) -> bool {
        !matches!(self, DeletionScope::RemoteOnlyReset)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeletionScope::AllOfType { .. } => "delete_all_of_type",
            DeletionScope::BeforeDate { .. } => "delete_before",
            DeletionScope::InRange { .. } => "delete_in_range",
            DeletionScope::AllTypes => "delete_all_types",
            DeletionScope::RemoteOnlyReset => "reset_remote",
            DeletionScope::FactoryReset => "factory_reset",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.predicate().validate()
    }
}

impl fmt::Display for DeletionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletionScope::AllOfType { record_type } => write!(f, "all {} records", record_type),
            DeletionScope::BeforeDate { record_type, .. }
            | DeletionScope::InRange { record_type, .. } => {
                write!(f, "{} records {}", record_type, self.predicate())
            }
            DeletionScope::AllTypes => f.write_str("all records of every type"),
            DeletionScope::RemoteOnlyReset => f.write_str("all remote records (local data kept)"),
            DeletionScope::FactoryReset => f.write_str("all remote and local data (factory reset)"),
        }
    }
}

/// Identifier of a record in the remote store, or of an entity in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque continuation token handed out by the remote store.
#[derive(Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

// Tokens may embed server state; keep them out of logs.
impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor(<{} bytes>)", self.0.len())
    }
}
