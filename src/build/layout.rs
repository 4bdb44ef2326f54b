//! On-disk layout of a project's dependency state

use crate::cache::VersionRecordStore;
use crate::project::{Platform, ProjectIdentity};
use std::path::{Path, PathBuf};

/// Directory under the project root that holds all dependency state
pub const QUARRY_DIR: &str = "Quarry";

/// Where dependency sources are checked out
pub const CHECKOUTS_DIR: &str = "Checkouts";

/// Where build products and version files live
pub const BUILD_DIR: &str = "Build";

/// Paths derived from a project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn checkouts_dir(&self) -> PathBuf {
        self.root.join(QUARRY_DIR).join(CHECKOUTS_DIR)
    }

    /// `Quarry/Checkouts/<name>`
    pub fn checkout_path(&self, project: &ProjectIdentity) -> PathBuf {
        self.checkouts_dir().join(project.name())
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(QUARRY_DIR).join(BUILD_DIR)
    }

    /// Output directory handed to the toolchain for one platform
    pub fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.build_dir().join(platform.name())
    }

    /// `Quarry/Build/<Platform>/<name>`, the artifact that gets fingerprinted
    pub fn artifact_path(&self, project: &ProjectIdentity, platform: Platform) -> PathBuf {
        self.platform_dir(platform).join(project.name())
    }

    /// Version files are stored next to the build products
    pub fn record_store(&self) -> VersionRecordStore {
        VersionRecordStore::new(self.build_dir())
    }
}
