//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to the coordinator.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::{command_name, confirmation_prompt};
pub use output::{exit_code, map_error};
pub use parse::{parse_date, Cli, Commands};
pub use presentation::{format_deletion_result, format_progress_event, format_status, StatusReport};
pub use route::RunContext;
