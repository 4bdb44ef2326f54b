//! Build options

use crate::config::schema::BuildConfig;
use crate::project::Platform;
use std::collections::BTreeSet;

/// What to build and whether cached builds may be reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Build configuration name, passed through to the toolchain
    pub configuration: String,

    /// Platforms to build; empty means every platform the dependency supports
    pub platforms: BTreeSet<Platform>,

    /// When false every requested platform is rebuilt
    pub cache_builds: bool,
}

impl BuildOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            configuration: config.configuration.clone(),
            platforms: config.platforms.iter().copied().collect(),
            cache_builds: config.cache_builds,
        }
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&BuildConfig::default())
    }
}
