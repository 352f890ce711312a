//! CLI presentation: text and json formatters per command family.

mod deletion;
mod status;

pub use deletion::{format_deletion_result, format_progress_event};
pub use status::{format_config, format_status, StatusReport};
