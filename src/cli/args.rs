//! CLI argument definitions using clap derive

use crate::project::Platform;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Quarry - source-based dependency manager
///
/// Fetches, checks out and builds a project's dependencies, skipping
/// builds that are already up to date.
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "QUARRY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .quarry.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, check out and build dependencies
    Build(BuildArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Directory containing the Quarryfile (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub project_directory: Option<PathBuf>,

    /// Platform to build (repeatable; default: all supported)
    #[arg(long = "platform", value_name = "PLATFORM")]
    pub platforms: Vec<Platform>,

    /// Build configuration name
    #[arg(long)]
    pub configuration: Option<String>,

    /// Rebuild everything, ignoring cached builds
    #[arg(long)]
    pub no_cache_builds: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
