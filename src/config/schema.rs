//! Configuration schema for Quarry
//!
//! Global configuration is stored at `~/.config/quarry/config.toml`; a
//! project may override any key in `.quarry.toml`.

use crate::fetch::DEFAULT_FETCH_WINDOW;
use crate::project::{GitProtocol, Platform};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Repository fetch settings
    pub fetch: FetchConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Repository fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Seconds during which a fetched remote is not fetched again
    pub throttle_secs: u64,

    /// Protocol for hosted repositories
    pub protocol: GitProtocol,

    /// Where repository mirrors are kept (default: user cache directory)
    pub mirror_dir: Option<PathBuf>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            throttle_secs: DEFAULT_FETCH_WINDOW.as_secs(),
            protocol: GitProtocol::Https,
            mirror_dir: None,
        }
    }
}

/// Build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build configuration name passed to the build command
    pub configuration: String,

    /// Platforms to build (empty = every platform a dependency supports)
    pub platforms: Vec<Platform>,

    /// Skip dependencies whose cached build is still valid
    pub cache_builds: bool,

    /// Command run in each checkout to build one platform
    pub command: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            configuration: "Release".to_string(),
            platforms: vec![],
            cache_builds: true,
            command: vec!["./build.sh".to_string()],
        }
    }
}
