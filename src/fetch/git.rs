//! Git command-line transport
//!
//! Implements the RepositoryTransport trait by running `git`. Mirrors are
//! bare clones; checkouts use the mirror as git dir and the dependency's
//! checkout folder as work tree.

use crate::error::{QuarryError, QuarryResult};
use crate::fetch::transport::RepositoryTransport;
use async_trait::async_trait;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// Repository transport using the `git` executable
#[derive(Debug, Clone, Default)]
pub struct GitTransport;

impl GitTransport {
    /// Create a new git transport
    pub fn new() -> Self {
        Self
    }

    /// Check if git is installed
    pub async fn git_installed() -> bool {
        Command::new("git")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Run git and return its output, whatever the exit status
    async fn run<I, S>(&self, args: I) -> QuarryResult<(String, Output)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<_> = args
            .into_iter()
            .map(|a| a.as_ref().to_os_string())
            .collect();
        let command_line = format!(
            "git {}",
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        debug!("Executing: {}", command_line);

        let output = Command::new("git")
            .args(&args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| QuarryError::command_failed(command_line.clone(), e))?;

        Ok((command_line, output))
    }

    /// Run git and fail unless it exits successfully
    async fn exec<I, S>(&self, args: I) -> QuarryResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (display, output) = self.run(args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QuarryError::command_exec(display, stderr.trim()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run git as a yes/no question answered by the exit status
    async fn check<I, S>(&self, args: I) -> QuarryResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (_, output) = self.run(args).await?;
        Ok(output.status.success())
    }
}

#[async_trait]
impl RepositoryTransport for GitTransport {
    async fn is_repository(&self, path: &Path) -> bool {
        if !path.is_dir() {
            return false;
        }
        self.check([OsStr::new("-C"), path.as_os_str(), OsStr::new("rev-parse"), OsStr::new("--git-dir")])
            .await
            .unwrap_or(false)
    }

    async fn clone_repository(&self, remote: &str, destination: &Path) -> QuarryResult<()> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                QuarryError::io(format!("creating directory {}", parent.display()), e)
            })?;
        }

        self.exec([
            OsStr::new("clone"),
            OsStr::new("--bare"),
            OsStr::new("--quiet"),
            OsStr::new(remote),
            destination.as_os_str(),
        ])
        .await?;
        Ok(())
    }

    async fn fetch(&self, repository: &Path, remote: &str) -> QuarryResult<()> {
        self.exec([
            OsStr::new("-C"),
            repository.as_os_str(),
            OsStr::new("fetch"),
            OsStr::new("--prune"),
            OsStr::new(remote),
            // Tags may be moved upstream; take them as they are now
            OsStr::new("+refs/tags/*:refs/tags/*"),
            OsStr::new("+refs/heads/*:refs/heads/*"),
        ])
        .await?;
        Ok(())
    }

    async fn commit_exists(&self, repository: &Path, commitish: &str) -> QuarryResult<bool> {
        let spec = format!("{}^{{commit}}", commitish);
        self.check([
            OsStr::new("-C"),
            repository.as_os_str(),
            OsStr::new("rev-parse"),
            OsStr::new("--verify"),
            OsStr::new("--quiet"),
            OsStr::new(&spec),
        ])
        .await
    }

    async fn is_symbolic_reference(
        &self,
        repository: &Path,
        commitish: &str,
    ) -> QuarryResult<bool> {
        if commitish == "HEAD" {
            return Ok(true);
        }
        self.check([
            OsStr::new("-C"),
            repository.as_os_str(),
            OsStr::new("show-ref"),
            OsStr::new("--quiet"),
            OsStr::new(commitish),
        ])
        .await
    }

    async fn current_revision(&self, repository: &Path) -> QuarryResult<String> {
        self.exec([
            OsStr::new("-C"),
            repository.as_os_str(),
            OsStr::new("rev-parse"),
            OsStr::new("HEAD"),
        ])
        .await
    }

    async fn checkout(
        &self,
        repository: &Path,
        commitish: &str,
        working_directory: &Path,
    ) -> QuarryResult<()> {
        tokio::fs::create_dir_all(working_directory)
            .await
            .map_err(|e| {
                QuarryError::io(
                    format!("creating checkout {}", working_directory.display()),
                    e,
                )
            })?;

        let git_dir = format!("--git-dir={}", repository.display());
        let work_tree = format!("--work-tree={}", working_directory.display());
        self.exec([
            git_dir.as_str(),
            work_tree.as_str(),
            "checkout",
            "--quiet",
            "--force",
            commitish,
        ])
        .await?;
        Ok(())
    }
}
