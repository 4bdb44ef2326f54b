//! Clone-or-fetch decisions
//!
//! For one repository and an optional wanted commit-ish, decides whether the
//! local mirror must be cloned, fetched, or can be used as it is:
//!
//! | Mirror | Commit-ish | Action |
//! |--------|------------|--------|
//! | missing | any | clone |
//! | present | commit already in the mirror | none |
//! | present | branch or tag, or unknown commit | fetch |
//! | present | none | fetch, unless throttled |

use crate::error::{QuarryError, QuarryResult};
use crate::fetch::throttle::FetchThrottle;
use crate::fetch::transport::RepositoryTransport;
use crate::project::{GitProtocol, ProjectIdentity};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// What is being done to a dependency's repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectEvent {
    /// Mirror is being cloned
    Cloning(ProjectIdentity),
    /// Mirror is being updated from its remote
    Fetching(ProjectIdentity),
    /// A revision is being checked out of the mirror
    CheckingOut(ProjectIdentity, String),
}

impl ProjectEvent {
    pub fn project(&self) -> &ProjectIdentity {
        match self {
            Self::Cloning(project) | Self::Fetching(project) | Self::CheckingOut(project, _) => {
                project
            }
        }
    }
}

impl fmt::Display for ProjectEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cloning(project) => write!(f, "Cloning {}", project.name()),
            Self::Fetching(project) => write!(f, "Fetching {}", project.name()),
            Self::CheckingOut(project, revision) => {
                write!(f, "Checking out {} at \"{}\"", project.name(), revision)
            }
        }
    }
}

/// Outcome of one clone-or-fetch decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The lifecycle event, or `None` when the mirror was already sufficient
    pub event: Option<ProjectEvent>,
    /// Local mirror location
    pub location: PathBuf,
}

/// Decides between clone, fetch and no-op for repository mirrors
#[derive(Clone)]
pub struct CloneOrFetchCoordinator {
    transport: Arc<dyn RepositoryTransport>,
    throttle: Arc<FetchThrottle>,
}

impl CloneOrFetchCoordinator {
    pub fn new(transport: Arc<dyn RepositoryTransport>, throttle: Arc<FetchThrottle>) -> Self {
        Self {
            transport,
            throttle,
        }
    }

    pub fn throttle(&self) -> &FetchThrottle {
        &self.throttle
    }

    /// Make sure the mirror at `destination` can serve `commitish`.
    ///
    /// `on_event` is called before a clone or fetch starts. Transport
    /// failures are returned as `RepositoryOperationFailed`; nothing is
    /// retried.
    pub async fn resolve(
        &self,
        project: &ProjectIdentity,
        protocol: GitProtocol,
        destination: &Path,
        commitish: Option<&str>,
        on_event: &(dyn Fn(&ProjectEvent) + Send + Sync),
    ) -> QuarryResult<Resolution> {
        let remote = project.remote_url(protocol);
        let repository_error = |e| QuarryError::repository(project, e);

        if !self.transport.is_repository(destination).await {
            let event = ProjectEvent::Cloning(project.clone());
            on_event(&event);
            info!("{}", event);

            self.transport
                .clone_repository(&remote, destination)
                .await
                .map_err(repository_error)?;

            return Ok(self.resolved(Some(event), destination));
        }

        if let Some(commitish) = commitish {
            let exists = self
                .transport
                .commit_exists(destination, commitish)
                .await
                .map_err(repository_error)?;

            if exists
                && !self
                    .transport
                    .is_symbolic_reference(destination, commitish)
                    .await
                    .map_err(repository_error)?
            {
                debug!("{} already has commit {}", project, commitish);
                return Ok(self.resolved(None, destination));
            }
        } else if self.throttle.should_skip_fetch(&remote, Instant::now()) {
            return Ok(self.resolved(None, destination));
        }

        let event = ProjectEvent::Fetching(project.clone());
        on_event(&event);
        info!("{}", event);

        self.transport
            .fetch(destination, &remote)
            .await
            .map_err(repository_error)?;
        self.throttle.record_fetch(&remote, Instant::now());

        Ok(self.resolved(Some(event), destination))
    }

    fn resolved(&self, event: Option<ProjectEvent>, destination: &Path) -> Resolution {
        Resolution {
            event,
            location: destination.to_path_buf(),
        }
    }
}
