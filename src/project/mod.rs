//! Projects, dependencies and platforms

pub mod identity;
pub mod platform;

pub use identity::{normalize_url, GitProtocol, ProjectIdentity};
pub use platform::Platform;

use std::fmt;

/// A project pinned at a version or revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Source repository
    pub project: ProjectIdentity,

    /// Commit-ish to check out (tag, branch or commit hash)
    pub version: String,
}

impl Dependency {
    pub fn new(project: ProjectIdentity, version: impl Into<String>) -> Self {
        Self {
            project,
            version: version.into(),
        }
    }

    /// Scheme name reported when this dependency is built for `platform`
    pub fn scheme_name(&self, platform: Platform) -> String {
        format!("{}-{}", self.project.name(), platform)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.project, self.version)
    }
}
