//! Build toolchain abstraction
//!
//! The orchestrator never compiles anything itself. It asks a `Toolchain`
//! which platforms a dependency supports and to build one platform at a
//! time into the project's build directory.

use crate::error::{QuarryError, QuarryResult};
use crate::manifest::{Manifest, PRIMARY_MANIFEST};
use crate::project::{Dependency, Platform};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Environment variable naming the platform being built
pub const PLATFORM_ENV: &str = "QUARRY_PLATFORM";

/// Environment variable naming the build configuration
pub const CONFIGURATION_ENV: &str = "QUARRY_CONFIGURATION";

/// Environment variable naming the directory the artifact must be written to
pub const OUTPUT_ENV: &str = "QUARRY_OUTPUT";

/// One platform build of one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub dependency: Dependency,
    pub platform: Platform,
    pub configuration: String,
    /// Checked-out sources
    pub checkout: PathBuf,
    /// Platform build directory; the artifact is `<output>/<name>`
    pub output: PathBuf,
}

/// Abstract build invoker
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Platforms the dependency can be built for
    async fn platforms(
        &self,
        dependency: &Dependency,
        checkout: &Path,
    ) -> QuarryResult<BTreeSet<Platform>>;

    /// Build one platform; failures are `ToolchainFailure`
    async fn build(&self, request: &BuildRequest) -> QuarryResult<()>;
}

/// Toolchain that runs a configured command inside the checkout
#[derive(Debug, Clone)]
pub struct CommandToolchain {
    command: Vec<String>,
}

impl CommandToolchain {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Toolchain for CommandToolchain {
    async fn platforms(
        &self,
        _dependency: &Dependency,
        checkout: &Path,
    ) -> QuarryResult<BTreeSet<Platform>> {
        let declared = Manifest::from_file(&checkout.join(PRIMARY_MANIFEST))
            .await?
            .map(|m| m.platforms)
            .unwrap_or_default();

        if declared.is_empty() {
            Ok(Platform::all().iter().copied().collect())
        } else {
            Ok(declared.into_iter().collect())
        }
    }

    async fn build(&self, request: &BuildRequest) -> QuarryResult<()> {
        let failure = |reason: String| QuarryError::ToolchainFailure {
            project: request.dependency.project.clone(),
            platform: request.platform.to_string(),
            reason,
        };

        let Some((program, args)) = self.command.split_first() else {
            return Err(failure("no build command configured".to_string()));
        };

        tokio::fs::create_dir_all(&request.output)
            .await
            .map_err(|e| {
                QuarryError::io(format!("creating {}", request.output.display()), e)
            })?;

        info!(
            "Building {} for {} ({})",
            request.dependency.project, request.platform, request.configuration
        );

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&request.checkout)
            .env(PLATFORM_ENV, request.platform.name())
            .env(CONFIGURATION_ENV, &request.configuration)
            .env(OUTPUT_ENV, &request.output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| failure(format!("could not run {}: {}", program, e)))?;

        let name = request.dependency.project.name().to_string();
        let output = stream_child_output(&mut child, &|line| debug!("[{}] {}", name, line)).await;

        let status = child
            .wait()
            .await
            .map_err(|e| failure(format!("waiting for {}: {}", program, e)))?;

        if !status.success() {
            let tail = build_error_output(&output);
            return Err(failure(format!("{} exited with {}\n{}", program, status, tail)));
        }

        Ok(())
    }
}

/// Extract the useful tail of build output for error diagnostics.
///
/// Returns the last `BUILD_ERROR_TAIL_LINES` lines so error messages are
/// actionable without being overwhelming.
pub(crate) fn build_error_output(lines: &[String]) -> String {
    let start = lines.len().saturating_sub(BUILD_ERROR_TAIL_LINES);
    lines[start..].join("\n")
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines for error reporting.
async fn stream_child_output(
    child: &mut Child,
    on_output: &(dyn Fn(&str) + Send + Sync),
) -> Vec<String> {
    let mut all_output = Vec::new();
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return all_output;
    };

    let mut stdout_reader = BufReader::new(stdout).lines();
    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(&line);
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(&line);
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    all_output
}
