//! Quarry - source-based dependency manager
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use quarry::cli::{Cli, Commands};
use quarry::config::{Config, ConfigManager};
use quarry::error::{QuarryError, QuarryResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> QuarryResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set, starting from the project
    // being built when one is named
    let local_config_path = if cli.no_local {
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| QuarryError::io("getting current directory", e))?;
        let start = match &cli.command {
            Commands::Build(args) => args
                .project_directory
                .as_ref()
                .map_or_else(|| cwd.clone(), |dir| cwd.join(dir)),
            Commands::Config(_) => cwd,
        };
        ConfigManager::find_local_config(&start)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    init_logging(cli.verbose, &config);
    if let Some(ref path) = local_config_path {
        debug!("Using local config: {}", path.display());
    }
    quarry::ui::init_theme();

    // Dispatch to command
    match cli.command {
        Commands::Build(args) => quarry::cli::commands::build(args, &config).await,
        Commands::Config(args) => {
            quarry::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` counts as one `-v`
fn init_logging(verbose: u8, config: &Config) {
    let level = verbose.max(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("quarry=warn"),
        1 => EnvFilter::new("quarry=info"),
        _ => EnvFilter::new("quarry=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
