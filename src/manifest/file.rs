//! Manifest parsing
//!
//! A manifest is a TOML document listing dependencies:
//!
//! ```toml
//! platforms = ["Mac", "iOS"]
//!
//! [[dependency]]
//! github = "robrix/Prelude"
//! version = "1.6.0"
//!
//! [[dependency]]
//! git = "https://example.com/team/lib.git"
//! version = "main"
//! ```

use crate::error::{QuarryError, QuarryResult};
use crate::project::{Dependency, Platform, ProjectIdentity};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Parsed manifest
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    /// Platforms the declaring project can be built for (empty = all)
    pub platforms: Vec<Platform>,

    /// Declared dependencies, in declaration order, duplicates included
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    platforms: Vec<Platform>,

    #[serde(default, rename = "dependency")]
    dependencies: Vec<RawDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDependency {
    github: Option<String>,
    git: Option<String>,
    version: String,
}

impl RawDependency {
    fn into_dependency(self) -> Result<Dependency, String> {
        let project = match (self.github, self.git) {
            (Some(reference), None) => ProjectIdentity::parse_github(&reference),
            (None, Some(url)) => ProjectIdentity::git(&url),
            (Some(_), Some(_)) => return Err("dependency has both `github` and `git`".into()),
            (None, None) => return Err("dependency needs `github` or `git`".into()),
        }
        .map_err(|e| e.to_string())?;

        if self.version.trim().is_empty() {
            return Err(format!("dependency {} has an empty version", project));
        }

        Ok(Dependency::new(project, self.version.trim()))
    }
}

impl Manifest {
    /// Parse a manifest from a file on disk.
    ///
    /// Returns `None` if the file does not exist.
    pub async fn from_file(path: &Path) -> QuarryResult<Option<Self>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(QuarryError::io(
                    format!("reading manifest {}", path.display()),
                    e,
                ))
            }
        };
        Self::parse(&content, path).map(Some)
    }

    /// Parse a manifest from a TOML string; `path` is used for error reporting
    pub fn parse(content: &str, path: impl Into<PathBuf>) -> QuarryResult<Self> {
        let path = path.into();
        let invalid = |reason: String| QuarryError::ManifestInvalid {
            path: path.clone(),
            reason,
        };

        let raw: RawManifest = toml::from_str(content).map_err(|e| invalid(e.to_string()))?;
        let dependencies = raw
            .dependencies
            .into_iter()
            .map(RawDependency::into_dependency)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        Ok(Self {
            platforms: raw.platforms,
            dependencies,
        })
    }
}
