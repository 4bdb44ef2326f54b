//! Combining the primary and private manifests
//!
//! Every project may be declared exactly once across both files. All
//! repeated declarations are collected and reported together.

use crate::error::{QuarryError, QuarryResult};
use crate::project::{Dependency, ProjectIdentity};
use std::collections::HashMap;
use std::fmt;

/// Where a dependency declaration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ManifestSource {
    /// `Quarryfile`
    Primary,
    /// `Quarryfile.private`
    Private,
}

impl ManifestSource {
    /// File name of the manifest for this source
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Primary => super::PRIMARY_MANIFEST,
            Self::Private => super::PRIVATE_MANIFEST,
        }
    }
}

impl fmt::Display for ManifestSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// A project declared more than once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateDependency {
    pub project: ProjectIdentity,
    pub locations: Vec<ManifestSource>,
}

impl fmt::Display for DuplicateDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let locations: Vec<&str> = self.locations.iter().map(|l| l.file_name()).collect();
        write!(f, "{} ({})", self.project, locations.join(", "))
    }
}

/// Merge primary and private dependency lists.
///
/// Fails with `ManifestMissing` when neither source is present and with
/// `DuplicateDependencies` (sorted by canonical identity) when any project
/// appears in more than one location. Otherwise returns the union with
/// primary declarations first.
pub fn merge(
    primary: Option<Vec<Dependency>>,
    private: Option<Vec<Dependency>>,
) -> QuarryResult<Vec<Dependency>> {
    if primary.is_none() && private.is_none() {
        return Err(QuarryError::ManifestMissing);
    }

    let tagged = primary
        .into_iter()
        .flatten()
        .map(|d| (d, ManifestSource::Primary))
        .chain(
            private
                .into_iter()
                .flatten()
                .map(|d| (d, ManifestSource::Private)),
        );

    let mut locations: HashMap<ProjectIdentity, Vec<ManifestSource>> = HashMap::new();
    let mut merged = Vec::new();

    for (dependency, source) in tagged {
        let seen = locations.entry(dependency.project.clone()).or_default();
        if seen.is_empty() {
            merged.push(dependency);
        }
        seen.push(source);
    }

    let mut duplicates: Vec<DuplicateDependency> = locations
        .into_iter()
        .filter(|(_, locations)| locations.len() > 1)
        .map(|(project, locations)| DuplicateDependency { project, locations })
        .collect();

    if !duplicates.is_empty() {
        duplicates.sort_by_key(|d| d.project.canonical());
        return Err(QuarryError::DuplicateDependencies(duplicates));
    }

    Ok(merged)
}
