//! Project identifiers
//!
//! A project is either a hosted `owner/name` pair or a raw git URL. Two
//! identifiers naming the same repository through different URL spellings
//! compare equal: comparison, hashing and ordering all go through the
//! canonical `host/path` form.

use crate::error::{QuarryError, QuarryResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

const GITHUB_HOST: &str = "github.com";

/// Transport used to reach hosted repositories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GitProtocol {
    #[default]
    Https,
    Ssh,
}

/// Identifies the source repository of a dependency
#[derive(Debug, Clone)]
pub enum ProjectIdentity {
    /// A repository hosted on GitHub
    GitHub { owner: String, name: String },
    /// Any other git repository, by URL
    Git(String),
}

impl ProjectIdentity {
    /// Parse an `owner/name` GitHub reference
    pub fn parse_github(reference: &str) -> QuarryResult<Self> {
        let invalid = |reason: &str| QuarryError::InvalidIdentity {
            input: reference.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = reference.trim().trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        let mut parts = trimmed.split('/');
        let (owner, name) = match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => (owner, name),
            _ => return Err(invalid("expected owner/name")),
        };

        if owner.is_empty() || name.is_empty() {
            return Err(invalid("owner and name must not be empty"));
        }

        Ok(Self::GitHub {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Create an identifier for a raw git URL
    pub fn git(url: &str) -> QuarryResult<Self> {
        let url = url.trim();
        if url.is_empty() || normalize_url(url).is_empty() {
            return Err(QuarryError::InvalidIdentity {
                input: url.to_string(),
                reason: "git URL must not be empty".to_string(),
            });
        }
        Ok(Self::Git(url.to_string()))
    }

    /// Short project name, used for checkout directories and scheme names
    pub fn name(&self) -> &str {
        match self {
            Self::GitHub { name, .. } => name,
            Self::Git(url) => {
                let trimmed = url.trim_end_matches('/');
                let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
                trimmed
                    .rsplit(['/', ':'])
                    .next()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(trimmed)
            }
        }
    }

    /// Canonical `host/path` form used for equality
    pub fn canonical(&self) -> String {
        match self {
            Self::GitHub { owner, name } => {
                format!("{}/{}/{}", GITHUB_HOST, owner, name).to_ascii_lowercase()
            }
            Self::Git(url) => normalize_url(url),
        }
    }

    /// Remote location to clone from
    pub fn remote_url(&self, protocol: GitProtocol) -> String {
        match (self, protocol) {
            (Self::GitHub { owner, name }, GitProtocol::Https) => {
                format!("https://{}/{}/{}.git", GITHUB_HOST, owner, name)
            }
            (Self::GitHub { owner, name }, GitProtocol::Ssh) => {
                format!("git@{}:{}/{}.git", GITHUB_HOST, owner, name)
            }
            (Self::Git(url), _) => url.clone(),
        }
    }

    /// Filesystem-safe key derived from the canonical form
    pub fn file_key(&self) -> String {
        self.canonical()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl PartialEq for ProjectIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl Eq for ProjectIdentity {}

impl Hash for ProjectIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical().hash(state);
    }
}

impl PartialOrd for ProjectIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProjectIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical().cmp(&other.canonical())
    }
}

impl fmt::Display for ProjectIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub { owner, name } => write!(f, "{}/{}", owner, name),
            Self::Git(url) => write!(f, "{}", url),
        }
    }
}

/// Normalize a git URL to `host/path`.
///
/// Strips the scheme, user info, port, trailing slashes and `.git`, and turns
/// scp-like `host:path` into `host/path`. Hosts are case-insensitive; on
/// GitHub the whole path is.
pub fn normalize_url(url: &str) -> String {
    let mut rest = url.trim();

    let had_scheme = match rest.find("://") {
        Some(idx) => {
            rest = &rest[idx + 3..];
            true
        }
        None => false,
    };

    // Local paths have no host component
    if rest.starts_with('/') {
        return strip_repo_suffix(rest).to_string();
    }

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    };

    let authority = authority.rsplit('@').next().unwrap_or(authority);
    let (host, path) = match authority.split_once(':') {
        // scheme://host:port/path
        Some((host, _port)) if had_scheme => (host.to_string(), path.to_string()),
        // user@host:owner/name
        Some((host, first)) => {
            let joined = if path.is_empty() {
                first.to_string()
            } else {
                format!("{}/{}", first, path)
            };
            (host.to_string(), joined)
        }
        None => (authority.to_string(), path.to_string()),
    };

    let host = host.to_ascii_lowercase();
    let path = strip_repo_suffix(path.trim_start_matches('/'));
    let normalized = if path.is_empty() {
        host.clone()
    } else {
        format!("{}/{}", host, path)
    };

    if host == GITHUB_HOST {
        normalized.to_ascii_lowercase()
    } else {
        normalized
    }
}

fn strip_repo_suffix(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    path.trim_end_matches('/')
}
