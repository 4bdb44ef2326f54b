//! Project manifests
//!
//! A project declares dependencies in `Quarryfile` and, for dependencies
//! only its own developers need, `Quarryfile.private`. The two are combined
//! into one dependency set before anything is fetched or built.

pub mod file;
pub mod merge;

pub use file::Manifest;
pub use merge::{merge, DuplicateDependency, ManifestSource};

use crate::error::QuarryResult;
use crate::project::Dependency;
use std::path::Path;
use tracing::debug;

/// Primary manifest file name
pub const PRIMARY_MANIFEST: &str = "Quarryfile";

/// Private manifest file name
pub const PRIVATE_MANIFEST: &str = "Quarryfile.private";

/// Load and merge both manifests in `directory`
pub async fn load_combined(directory: &Path) -> QuarryResult<Vec<Dependency>> {
    let primary = Manifest::from_file(&directory.join(PRIMARY_MANIFEST)).await?;
    let private = Manifest::from_file(&directory.join(PRIVATE_MANIFEST)).await?;

    debug!(
        "Loading manifests in {} (primary: {}, private: {})",
        directory.display(),
        primary.is_some(),
        private.is_some()
    );

    merge(
        primary.map(|m| m.dependencies),
        private.map(|m| m.dependencies),
    )
}
