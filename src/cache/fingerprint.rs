//! Content fingerprints of build artifacts
//!
//! A fingerprint is the SHA256 of an artifact's contents. Directory
//! artifacts (bundles) are hashed as a sorted walk of relative paths and
//! file contents, so any byte changed anywhere in the bundle changes the
//! fingerprint.

use crate::error::{QuarryError, QuarryResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::Path;

/// Hex-encoded content hash of a build artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Computes fingerprints of on-disk build output
pub trait Fingerprinter: Send + Sync {
    /// Fingerprint the artifact at `artifact` (file or directory)
    fn fingerprint(&self, artifact: &Path) -> QuarryResult<Fingerprint>;
}

/// SHA256 fingerprinter over file contents
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentFingerprinter;

impl Fingerprinter for ContentFingerprinter {
    fn fingerprint(&self, artifact: &Path) -> QuarryResult<Fingerprint> {
        let metadata = fs::symlink_metadata(artifact).map_err(|e| {
            QuarryError::io(format!("reading artifact {}", artifact.display()), e)
        })?;

        let mut hasher = Sha256::new();
        if metadata.is_dir() {
            hash_tree(artifact, artifact, &mut hasher)?;
        } else {
            hash_entry(artifact, &metadata, &mut hasher)?;
        }

        Ok(Fingerprint(hex::encode(hasher.finalize())))
    }
}

fn hash_entry(path: &Path, metadata: &fs::Metadata, hasher: &mut Sha256) -> QuarryResult<()> {
    if metadata.file_type().is_symlink() {
        let target = fs::read_link(path)
            .map_err(|e| QuarryError::io(format!("reading link {}", path.display()), e))?;
        hasher.update(target.to_string_lossy().as_bytes());
        return Ok(());
    }

    let contents = fs::read(path)
        .map_err(|e| QuarryError::io(format!("reading artifact {}", path.display()), e))?;
    hasher.update((contents.len() as u64).to_le_bytes());
    hasher.update(&contents);
    Ok(())
}

fn hash_tree(root: &Path, dir: &Path, hasher: &mut Sha256) -> QuarryResult<()> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| QuarryError::io(format!("reading directory {}", dir.display()), e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| QuarryError::io(format!("reading directory {}", dir.display()), e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let metadata = fs::symlink_metadata(&path)
            .map_err(|e| QuarryError::io(format!("reading artifact {}", path.display()), e))?;

        let relative = path.strip_prefix(root).unwrap_or(&path);
        hasher.update(relative.to_string_lossy().as_bytes());
        hasher.update([0u8]);

        if metadata.is_dir() {
            hash_tree(root, &path, hasher)?;
        } else {
            hash_entry(&path, &metadata, hasher)?;
        }
    }

    Ok(())
}
