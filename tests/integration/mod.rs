//! Integration tests for the coordinated deletion engine

mod config_integration;
mod progress_observability;
mod remote_pagination;
pub mod test_utils;

pub use test_utils::with_xdg_env;
