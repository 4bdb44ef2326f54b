//! Error types for Quarry
//!
//! All modules use `QuarryResult<T>` as their return type.

use crate::manifest::DuplicateDependency;
use crate::project::ProjectIdentity;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Quarry operations
pub type QuarryResult<T> = Result<T, QuarryError>;

fn list_duplicates(duplicates: &[DuplicateDependency]) -> String {
    duplicates
        .iter()
        .map(|d| format!("\n\t{}", d))
        .collect::<String>()
}

fn list_name_conflicts(conflicts: &[Vec<ProjectIdentity>]) -> String {
    conflicts
        .iter()
        .map(|projects| {
            let listed: Vec<String> = projects.iter().map(ToString::to_string).collect();
            format!("\n\t{}", listed.join(", "))
        })
        .collect::<String>()
}

/// All errors that can occur in Quarry
#[derive(Error, Debug)]
pub enum QuarryError {
    // Manifest errors
    #[error("No manifest found (expected Quarryfile or Quarryfile.private)")]
    ManifestMissing,

    #[error("Invalid manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("The following dependencies are duplicates:{}", list_duplicates(.0))]
    DuplicateDependencies(Vec<DuplicateDependency>),

    #[error("These dependencies would share a checkout folder:{}", list_name_conflicts(.0))]
    ConflictingNames(Vec<Vec<ProjectIdentity>>),

    #[error("Dependency cycle detected involving {0}")]
    DependencyCycle(ProjectIdentity),

    #[error("Invalid project identifier '{input}': {reason}")]
    InvalidIdentity { input: String, reason: String },

    // Build cache errors
    #[error("Corrupt version file {path}: {reason}")]
    CorruptRecord { path: PathBuf, reason: String },

    #[error("Failed to write version file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Repository errors
    #[error("Repository operation failed for {project}: {source}")]
    RepositoryOperationFailed {
        project: ProjectIdentity,
        #[source]
        source: Box<QuarryError>,
    },

    // Build errors
    #[error("{project}: {source}")]
    PipelineFailed {
        project: ProjectIdentity,
        #[source]
        source: Box<QuarryError>,
    },

    #[error("Build failed for {project} ({platform}): {reason}")]
    ToolchainFailure {
        project: ProjectIdentity,
        platform: String,
        reason: String,
    },

    #[error("Skipped {project}: dependency {dependency} failed")]
    DependencyFailed {
        project: ProjectIdentity,
        dependency: ProjectIdentity,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl QuarryError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Wrap a transport error with the project it happened for
    pub fn repository(project: &ProjectIdentity, source: QuarryError) -> Self {
        Self::RepositoryOperationFailed {
            project: project.clone(),
            source: Box::new(source),
        }
    }

    /// Attach the dependency a build-pass error happened for.
    ///
    /// Errors that already name a project are returned unchanged.
    pub fn pipeline(project: &ProjectIdentity, source: QuarryError) -> Self {
        if source.project().is_some() {
            return source;
        }
        Self::PipelineFailed {
            project: project.clone(),
            source: Box::new(source),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RepositoryOperationFailed { .. } | Self::ToolchainFailure { .. } => true,
            Self::PipelineFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// The project a pipeline error belongs to, if any
    pub fn project(&self) -> Option<&ProjectIdentity> {
        match self {
            Self::RepositoryOperationFailed { project, .. }
            | Self::PipelineFailed { project, .. }
            | Self::ToolchainFailure { project, .. }
            | Self::DependencyFailed { project, .. } => Some(project),
            Self::DependencyCycle(project) => Some(project),
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ManifestMissing => {
                Some("Create a Quarryfile or Quarryfile.private in the project directory")
            }
            Self::DuplicateDependencies(_) => {
                Some("Remove the repeated entries so each project is declared once")
            }
            Self::ConflictingNames(_) => {
                Some("Dependencies are checked out by name; keep only one project per name")
            }
            Self::RepositoryOperationFailed { .. } => Some("Check network access and retry"),
            Self::PipelineFailed { source, .. } => source.hint(),
            _ => None,
        }
    }
}
