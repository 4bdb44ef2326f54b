//! Version files
//!
//! One JSON record per dependency, stored next to the build output as
//! `.<project key>.version`. A record names the commit-ish it was built from
//! and the fingerprint of each platform's artifact:
//!
//! ```json
//! {
//!   "commitish": "1.6.0",
//!   "platforms": { "Mac": "5f1c..." },
//!   "built_at": "2024-05-01T12:00:00Z"
//! }
//! ```

use crate::cache::fingerprint::Fingerprint;
use crate::error::{QuarryError, QuarryResult};
use crate::project::{Platform, ProjectIdentity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Persisted build state of one dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Commit-ish the artifacts were built from
    pub commitish: String,

    /// Platform name to artifact fingerprint
    #[serde(default)]
    pub platforms: BTreeMap<String, Fingerprint>,

    /// When the record was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
}

impl VersionRecord {
    /// Create a record for a build of `commitish` that just finished
    pub fn new(commitish: impl Into<String>) -> Self {
        Self {
            commitish: commitish.into(),
            platforms: BTreeMap::new(),
            built_at: Some(Utc::now()),
        }
    }

    /// Add a platform fingerprint
    pub fn with_platform(mut self, platform: Platform, fingerprint: Fingerprint) -> Self {
        self.platforms.insert(platform.name().to_string(), fingerprint);
        self
    }

    /// Stored fingerprint for `platform`
    pub fn fingerprint(&self, platform: Platform) -> Option<&Fingerprint> {
        self.platforms.get(platform.name())
    }
}

/// Reads and writes version files in one directory
#[derive(Debug, Clone)]
pub struct VersionRecordStore {
    directory: PathBuf,
}

impl VersionRecordStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the version file for `project`
    pub fn record_path(&self, project: &ProjectIdentity) -> PathBuf {
        self.directory
            .join(format!(".{}.version", project.file_key()))
    }

    /// Load the record for `project`.
    ///
    /// Returns `None` if no record exists and `CorruptRecord` if one exists
    /// but cannot be read or does not parse.
    pub async fn load(&self, project: &ProjectIdentity) -> QuarryResult<Option<VersionRecord>> {
        let path = self.record_path(project);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(QuarryError::CorruptRecord {
                    path,
                    reason: format!("unreadable: {}", e),
                })
            }
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| QuarryError::CorruptRecord {
                path,
                reason: e.to_string(),
            })
    }

    /// Replace the record for `project`.
    ///
    /// Writes to a temporary file in the same directory and renames it over
    /// the old record, so readers see either the old or the new record.
    pub async fn save(&self, project: &ProjectIdentity, record: &VersionRecord) -> QuarryResult<()> {
        let path = self.record_path(project);
        let temp_path = self.directory.join(format!(
            ".{}.version.{}.tmp",
            project.file_key(),
            std::process::id()
        ));

        let content = serde_json::to_string_pretty(record)?;

        let result = write_then_rename(&self.directory, &temp_path, &path, content.as_bytes()).await;
        if result.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        result.map_err(|source| QuarryError::WriteFailed {
            path: path.clone(),
            source,
        })?;

        debug!("Wrote version file {}", path.display());
        Ok(())
    }
}

async fn write_then_rename(
    directory: &Path,
    temp_path: &Path,
    path: &Path,
    content: &[u8],
) -> std::io::Result<()> {
    fs::create_dir_all(directory).await?;

    let mut file = fs::File::create(temp_path).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, path).await
}
