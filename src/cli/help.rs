//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::Commands;
use crate::types::DeletionScope;

/// Command name string for log fields (e.g. "delete_before", "status").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::DeleteAll { .. } => "delete_all",
        Commands::DeleteBefore { .. } => "delete_before",
        Commands::DeleteInRange { .. } => "delete_in_range",
        Commands::ResetRemote { .. } => "reset_remote",
        Commands::FactoryReset { .. } => "factory_reset",
        Commands::Status { .. } => "status",
        Commands::Config { .. } => "config",
    }
}

/// Deletion scope and output format of a deleting command; `None` otherwise.
pub fn deletion_target(command: &Commands) -> Option<(DeletionScope, &str)> {
    match command {
        Commands::DeleteAll {
            record_type: Some(record_type),
            format,
        } => Some((
            DeletionScope::AllOfType {
                record_type: *record_type,
            },
            format,
        )),
        Commands::DeleteAll {
            record_type: None,
            format,
        } => Some((DeletionScope::AllTypes, format)),
        Commands::DeleteBefore {
            record_type,
            before,
            format,
        } => Some((
            DeletionScope::BeforeDate {
                record_type: *record_type,
                cutoff: *before,
            },
            format,
        )),
        Commands::DeleteInRange {
            record_type,
            start,
            end,
            format,
        } => Some((
            DeletionScope::InRange {
                record_type: *record_type,
                start: *start,
                end: *end,
            },
            format,
        )),
        Commands::ResetRemote { format } => Some((DeletionScope::RemoteOnlyReset, format)),
        Commands::FactoryReset { format } => Some((DeletionScope::FactoryReset, format)),
        Commands::Status { .. } | Commands::Config { .. } => None,
    }
}

/// Prompt shown before a deletion starts.
pub fn confirmation_prompt(scope: &DeletionScope) -> String {
    match scope {
        DeletionScope::FactoryReset => {
            "Permanently delete ALL remote and local data and reset your baseline?".to_string()
        }
        DeletionScope::RemoteOnlyReset => {
            "Permanently delete all remote records? Local data on this device is kept.".to_string()
        }
        other => format!("Permanently delete {}?", other),
    }
}
