//! Erasure CLI Binary
//!
//! Command-line interface for coordinated deletion of remote and local user data.

use anyhow::Context;
use clap::Parser;
use erasure::cli::{exit_code, map_error, Cli, RunContext};
use erasure::config::ConfigLoader;
use erasure::error::DeletionError;
use erasure::logging::{init_logging, resolve_log_file_path, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Erasure CLI starting");

    match run(&cli) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => match e.downcast_ref::<DeletionError>() {
            Some(deletion_error) => {
                error!(code = deletion_error.code(), "Command failed: {}", deletion_error);
                eprintln!("{}", map_error(deletion_error));
                process::exit(exit_code(deletion_error));
            }
            None => {
                error!("Command failed: {:#}", e);
                eprintln!("error: {:#}", e);
                process::exit(1);
            }
        },
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let context = RunContext::new(cli.workspace.clone(), cli.config.clone(), cli.yes)
        .with_context(|| format!("initializing workspace {}", cli.workspace.display()))?;
    info!("CLI context initialized");
    Ok(context.execute(&cli.command)?)
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if cli.quiet {
        config.enabled = false;
    }
    if cli.verbose {
        config.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    }
    if config.enabled && config.output == "file" {
        config.file = Some(resolve_log_file_path(&config, &cli.workspace));
    }

    config
}
