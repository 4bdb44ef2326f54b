//! Build orchestration
//!
//! Drives one build pass over a project's dependencies:
//!
//! 1. Merge `Quarryfile` and `Quarryfile.private` (fatal on failure), and
//!    refuse dependencies that would share a checkout folder
//! 2. Clone or fetch every mirror and check out the pinned revision,
//!    concurrently
//! 3. Order dependencies by the manifests found in their checkouts
//! 4. Level by level, build the dependencies whose cached build is stale
//!
//! Results are pushed into a bounded channel as they happen. Dropping the
//! receiver cancels the pass at the next scheme or before a version file is
//! written.

use crate::build::graph::DependencyGraph;
use crate::build::layout::ProjectLayout;
use crate::build::options::BuildOptions;
use crate::build::toolchain::{BuildRequest, Toolchain};
use crate::cache::{BuildCacheEvaluator, Fingerprinter, VersionRecord};
use crate::error::{QuarryError, QuarryResult};
use crate::fetch::{CloneOrFetchCoordinator, FetchThrottle, ProjectEvent, RepositoryTransport};
use crate::manifest::{self, Manifest, PRIMARY_MANIFEST};
use crate::project::{Dependency, GitProtocol, Platform, ProjectIdentity};
use futures_util::future::join_all;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the result channel
const RESULT_BUFFER: usize = 32;

/// Callback for clone, fetch and checkout progress
pub type EventHandler = Arc<dyn Fn(&ProjectEvent) + Send + Sync>;

/// Item produced by a build pass
pub type BuildResult = QuarryResult<BuiltScheme>;

/// A scheme whose build has started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltScheme {
    pub project: ProjectIdentity,
    pub scheme: String,
}

/// A dependency checked out and ready to build
#[derive(Debug, Clone)]
struct Prepared {
    dependency: Dependency,
    checkout: PathBuf,
    /// Resolved revision of the checkout
    commitish: String,
    /// Projects named in the checkout's own manifest
    requires: Vec<ProjectIdentity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Fresh,
    Rebuilt,
    Failed,
    Cancelled,
}

/// Top-level driver of a build pass
#[derive(Clone)]
pub struct BuildOrchestrator {
    coordinator: CloneOrFetchCoordinator,
    transport: Arc<dyn RepositoryTransport>,
    toolchain: Arc<dyn Toolchain>,
    fingerprinter: Arc<dyn Fingerprinter>,
    mirror_dir: PathBuf,
    protocol: GitProtocol,
    on_event: EventHandler,
}

impl BuildOrchestrator {
    pub fn new(
        transport: Arc<dyn RepositoryTransport>,
        toolchain: Arc<dyn Toolchain>,
        fingerprinter: Arc<dyn Fingerprinter>,
        throttle: Arc<FetchThrottle>,
        mirror_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            coordinator: CloneOrFetchCoordinator::new(Arc::clone(&transport), throttle),
            transport,
            toolchain,
            fingerprinter,
            mirror_dir: mirror_dir.into(),
            protocol: GitProtocol::default(),
            on_event: Arc::new(|_: &ProjectEvent| {}),
        }
    }

    /// Protocol used for hosted repositories
    pub fn with_protocol(mut self, protocol: GitProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Observe clone, fetch and checkout events
    pub fn with_event_handler(mut self, handler: EventHandler) -> Self {
        self.on_event = handler;
        self
    }

    /// Start a build pass for the project at `root`.
    ///
    /// Schemes arrive in topological order; dependencies with no ordering
    /// between them may interleave. Per-dependency failures arrive as `Err`
    /// items and do not stop unrelated dependencies. Manifest errors and
    /// cycles end the pass after a single `Err`.
    pub fn build(&self, root: impl Into<PathBuf>, options: BuildOptions) -> mpsc::Receiver<BuildResult> {
        let (tx, rx) = mpsc::channel(RESULT_BUFFER);
        let orchestrator = self.clone();
        let layout = ProjectLayout::new(root);

        tokio::spawn(async move {
            if let Err(e) = orchestrator.run(&layout, &options, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        rx
    }

    async fn run(
        &self,
        layout: &ProjectLayout,
        options: &BuildOptions,
        tx: &mpsc::Sender<BuildResult>,
    ) -> QuarryResult<()> {
        let dependencies = manifest::load_combined(layout.root()).await?;
        check_checkout_names(&dependencies)?;
        info!("Building {} dependencies", dependencies.len());

        let prepared = join_all(
            dependencies
                .iter()
                .map(|dependency| self.prepare(layout, dependency)),
        )
        .await;

        let mut graph = DependencyGraph::new();
        for dependency in &dependencies {
            graph.add_project(dependency.project.clone());
        }

        let mut ready: HashMap<ProjectIdentity, Prepared> = HashMap::new();
        let mut outcomes: HashMap<ProjectIdentity, Outcome> = HashMap::new();

        for (dependency, result) in dependencies.iter().zip(prepared) {
            match result {
                Ok(prepared) => {
                    ready.insert(dependency.project.clone(), prepared);
                }
                Err(e) => {
                    outcomes.insert(dependency.project.clone(), Outcome::Failed);
                    let e = QuarryError::pipeline(&dependency.project, e);
                    if tx.send(Err(e)).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }

        for (project, prepared) in &ready {
            for required in &prepared.requires {
                graph.add_dependency(project, required)?;
            }
        }

        let evaluator = BuildCacheEvaluator::new(layout.record_store());

        for level in graph.levels()? {
            let pending: Vec<&Prepared> = level
                .iter()
                .filter(|project| !outcomes.contains_key(*project))
                .filter_map(|project| ready.get(project))
                .collect();

            let results = join_all(pending.iter().map(|prepared| {
                self.build_one(layout, options, &evaluator, &graph, &outcomes, prepared, tx)
            }))
            .await;

            for (prepared, outcome) in pending.iter().zip(results) {
                if outcome == Outcome::Cancelled {
                    debug!("Build pass cancelled");
                    return Ok(());
                }
                outcomes.insert(prepared.dependency.project.clone(), outcome);
            }
        }

        Ok(())
    }

    /// Mirror, check out and inspect one dependency
    async fn prepare(&self, layout: &ProjectLayout, dependency: &Dependency) -> QuarryResult<Prepared> {
        let project = &dependency.project;
        let mirror = self
            .coordinator
            .resolve(
                project,
                self.protocol,
                &self.mirror_dir.join(project.file_key()),
                Some(dependency.version.as_str()),
                &*self.on_event,
            )
            .await?
            .location;

        let checkout = layout.checkout_path(project);
        let event = ProjectEvent::CheckingOut(project.clone(), dependency.version.clone());
        (self.on_event)(&event);
        info!("{}", event);

        self.transport
            .checkout(&mirror, &dependency.version, &checkout)
            .await
            .map_err(|e| QuarryError::repository(project, e))?;

        let commitish = self
            .transport
            .current_revision(&mirror)
            .await
            .map_err(|e| QuarryError::repository(project, e))?;

        let requires = Manifest::from_file(&checkout.join(PRIMARY_MANIFEST))
            .await?
            .map(|m| m.dependencies.into_iter().map(|d| d.project).collect())
            .unwrap_or_default();

        Ok(Prepared {
            dependency: dependency.clone(),
            checkout,
            commitish,
            requires,
        })
    }

    /// Check one dependency's cache and rebuild it if needed
    #[allow(clippy::too_many_arguments)]
    async fn build_one(
        &self,
        layout: &ProjectLayout,
        options: &BuildOptions,
        evaluator: &BuildCacheEvaluator,
        graph: &DependencyGraph,
        outcomes: &HashMap<ProjectIdentity, Outcome>,
        prepared: &Prepared,
        tx: &mpsc::Sender<BuildResult>,
    ) -> Outcome {
        let project = &prepared.dependency.project;
        let requirements = graph.dependencies(project);

        if let Some(failed) = requirements
            .iter()
            .find(|r| outcomes.get(*r) == Some(&Outcome::Failed))
        {
            warn!("Skipping {}: {} failed", project, failed);
            let skipped = QuarryError::DependencyFailed {
                project: project.clone(),
                dependency: failed.clone(),
            };
            return Self::report(tx, skipped).await;
        }

        let upstream_rebuilt = requirements
            .iter()
            .any(|r| outcomes.get(r) == Some(&Outcome::Rebuilt));

        match self
            .rebuild_if_stale(layout, options, evaluator, prepared, upstream_rebuilt, tx)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => Self::report(tx, QuarryError::pipeline(project, e)).await,
        }
    }

    async fn rebuild_if_stale(
        &self,
        layout: &ProjectLayout,
        options: &BuildOptions,
        evaluator: &BuildCacheEvaluator,
        prepared: &Prepared,
        upstream_rebuilt: bool,
        tx: &mpsc::Sender<BuildResult>,
    ) -> QuarryResult<Outcome> {
        let dependency = &prepared.dependency;
        let project = &dependency.project;

        let platforms: BTreeSet<Platform> = if options.platforms.is_empty() {
            self.toolchain
                .platforms(dependency, &prepared.checkout)
                .await?
        } else {
            options.platforms.clone()
        };

        if upstream_rebuilt {
            debug!("{} depends on a rebuilt dependency", project);
        }

        let stale = evaluator
            .staleness(
                project,
                &prepared.commitish,
                &platforms,
                |platform| {
                    self.fingerprinter
                        .fingerprint(&layout.artifact_path(project, platform))
                },
                options.cache_builds && !upstream_rebuilt,
            )
            .await?;

        if stale.is_empty() {
            debug!("{} is up to date", project);
            return Ok(Outcome::Fresh);
        }

        let mut record = VersionRecord::new(prepared.commitish.clone());
        for &platform in &platforms {
            let scheme = BuiltScheme {
                project: project.clone(),
                scheme: dependency.scheme_name(platform),
            };
            if tx.send(Ok(scheme)).await.is_err() {
                return Ok(Outcome::Cancelled);
            }

            let request = BuildRequest {
                dependency: dependency.clone(),
                platform,
                configuration: options.configuration.clone(),
                checkout: prepared.checkout.clone(),
                output: layout.platform_dir(platform),
            };
            self.toolchain.build(&request).await?;

            let artifact = layout.artifact_path(project, platform);
            let fingerprint = self.fingerprinter.fingerprint(&artifact).map_err(|e| {
                QuarryError::ToolchainFailure {
                    project: project.clone(),
                    platform: platform.to_string(),
                    reason: format!("no build product at {}: {}", artifact.display(), e),
                }
            })?;
            record = record.with_platform(platform, fingerprint);
        }

        if tx.is_closed() {
            return Ok(Outcome::Cancelled);
        }

        evaluator.store().save(project, &record).await?;
        info!("Built {} at {}", project, prepared.commitish);

        Ok(Outcome::Rebuilt)
    }

    async fn report(tx: &mpsc::Sender<BuildResult>, error: QuarryError) -> Outcome {
        if tx.send(Err(error)).await.is_err() {
            Outcome::Cancelled
        } else {
            Outcome::Failed
        }
    }
}

/// Checkouts and build products are named after the project, so two
/// identities with the same name cannot be built side by side.
fn check_checkout_names(dependencies: &[Dependency]) -> QuarryResult<()> {
    let mut by_name: BTreeMap<String, Vec<ProjectIdentity>> = BTreeMap::new();
    for dependency in dependencies {
        by_name
            .entry(dependency.project.name().to_lowercase())
            .or_default()
            .push(dependency.project.clone());
    }

    let conflicts: Vec<Vec<ProjectIdentity>> = by_name
        .into_values()
        .filter(|projects| projects.len() > 1)
        .map(|mut projects| {
            projects.sort();
            projects
        })
        .collect();

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(QuarryError::ConflictingNames(conflicts))
    }
}
