//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::DeletionError;

/// Map domain errors to a stable `error[code]: message` line, with a hint
/// where the user can act on it.
pub fn map_error(e: &DeletionError) -> String {
    let hint = match e {
        DeletionError::NotAuthenticated => Some("check remote.api_token"),
        DeletionError::NetworkUnavailable => Some("check connectivity and remote.endpoint"),
        DeletionError::RateLimited { .. } => Some("wait and run the command again"),
        DeletionError::Config(_) => Some("run `erasure config --validate`"),
        _ => None,
    };
    match hint {
        Some(hint) => format!("error[{}]: {}\nhint: {}", e.code(), e, hint),
        None => format!("error[{}]: {}", e.code(), e),
    }
}

/// Process exit code for a failed command.
pub fn exit_code(e: &DeletionError) -> i32 {
    match e {
        DeletionError::Cancelled => 130,
        DeletionError::Config(_) | DeletionError::InvalidScope(_) => 2,
        _ => 1,
    }
}
