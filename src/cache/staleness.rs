//! Build cache evaluation
//!
//! Decides which requested platforms of a dependency must be rebuilt by
//! comparing its version file against the current checkout and the
//! artifacts on disk.

use crate::cache::fingerprint::Fingerprint;
use crate::cache::record::VersionRecordStore;
use crate::error::{QuarryError, QuarryResult};
use crate::project::{Platform, ProjectIdentity};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Compares version files against current state
#[derive(Debug, Clone)]
pub struct BuildCacheEvaluator {
    store: VersionRecordStore,
}

impl BuildCacheEvaluator {
    pub fn new(store: VersionRecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &VersionRecordStore {
        &self.store
    }

    /// Platforms in `requested` whose cached build cannot be trusted.
    ///
    /// A platform is fresh only if the record's commit-ish matches
    /// `current_commitish`, the record has a fingerprint for the platform, and
    /// `fingerprint_of` reproduces that fingerprint from the artifact on
    /// disk. A corrupt record counts as no record.
    pub async fn staleness<F>(
        &self,
        project: &ProjectIdentity,
        current_commitish: &str,
        requested: &BTreeSet<Platform>,
        fingerprint_of: F,
        cache_builds: bool,
    ) -> QuarryResult<BTreeSet<Platform>>
    where
        F: Fn(Platform) -> QuarryResult<Fingerprint>,
    {
        if !cache_builds || requested.is_empty() {
            return Ok(requested.clone());
        }

        let record = match self.store.load(project).await {
            Ok(record) => record,
            Err(QuarryError::CorruptRecord { path, reason }) => {
                warn!(
                    "Ignoring corrupt version file {}: {}",
                    path.display(),
                    reason
                );
                None
            }
            Err(e) => return Err(e),
        };

        let Some(record) = record else {
            debug!("No version file for {}", project);
            return Ok(requested.clone());
        };

        if record.commitish != current_commitish {
            debug!(
                "{} was built from {} but {} is checked out",
                project, record.commitish, current_commitish
            );
            return Ok(requested.clone());
        }

        let stale = requested
            .iter()
            .copied()
            .filter(|&platform| {
                let Some(stored) = record.fingerprint(platform) else {
                    debug!("{} has no cached build for {}", project, platform);
                    return true;
                };

                match fingerprint_of(platform) {
                    Ok(current) if &current == stored => false,
                    Ok(_) => {
                        debug!("{} artifact for {} changed since it was built", project, platform);
                        true
                    }
                    Err(e) => {
                        debug!("Cannot fingerprint {} for {}: {}", project, platform, e);
                        true
                    }
                }
            })
            .collect();

        Ok(stale)
    }
}
