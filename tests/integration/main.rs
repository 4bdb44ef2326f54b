//! Integration tests for Quarry

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn quarry() -> Command {
        cargo_bin_cmd!("quarry")
    }

    #[test]
    fn help_displays() {
        quarry()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Source-based dependency manager"));
    }

    #[test]
    fn version_displays() {
        quarry()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("quarry"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        quarry()
            .args(["--no-local", "config", "path"])
            .arg("--config")
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        quarry()
            .args(["--no-local", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]").and(predicate::str::contains("[build]")));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        quarry()
            .arg("--config")
            .arg(&path)
            .args(["--no-local", "config", "init"])
            .assert()
            .success();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("cache_builds = true"));
    }

    #[test]
    fn build_without_manifest_fails() {
        let temp = TempDir::new().unwrap();
        quarry()
            .current_dir(temp.path())
            .args(["--no-local", "build"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No manifest found"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn build_rejects_duplicates_across_manifests() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Quarryfile"),
            "[[dependency]]\ngithub = \"owner/Lib\"\nversion = \"1.0\"\n",
        )
        .unwrap();
        std::fs::write(
            temp.path().join("Quarryfile.private"),
            "[[dependency]]\ngithub = \"Owner/lib\"\nversion = \"2.0\"\n",
        )
        .unwrap();

        quarry()
            .arg("--no-local")
            .arg("build")
            .arg("--project-directory")
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("duplicates"))
            .stderr(predicate::str::contains("(Quarryfile, Quarryfile.private)"));
    }

    #[test]
    fn build_rejects_same_named_dependencies() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Quarryfile"),
            "[[dependency]]\ngithub = \"alice/Lib\"\nversion = \"1.0\"\n\n[[dependency]]\ngithub = \"bob/Lib\"\nversion = \"1.0\"\n",
        )
        .unwrap();

        quarry()
            .arg("--no-local")
            .arg("build")
            .arg("--project-directory")
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("share a checkout folder"))
            .stderr(predicate::str::contains("alice/Lib, bob/Lib"));
    }

    #[test]
    fn build_reads_local_config_of_project_directory() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("app");
        let elsewhere = temp.path().join("elsewhere");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::create_dir_all(&elsewhere).unwrap();
        std::fs::write(project.join(".quarry.toml"), "[build\n").unwrap();

        quarry()
            .current_dir(&elsewhere)
            .arg("--config")
            .arg(temp.path().join("global.toml"))
            .arg("build")
            .arg("--project-directory")
            .arg(&project)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains(".quarry.toml"));
    }

    #[test]
    fn build_rejects_invalid_manifest() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Quarryfile"), "[[dependency]]\nversion = 1\n").unwrap();

        quarry()
            .arg("--no-local")
            .arg("build")
            .arg("--project-directory")
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid manifest"));
    }
}

mod pipeline_tests {
    //! Build passes against in-process repositories and toolchains

    use async_trait::async_trait;
    use quarry::build::{BuildOptions, BuildOrchestrator, BuildRequest, BuildResult, Toolchain};
    use quarry::cache::{ContentFingerprinter, VersionRecordStore};
    use quarry::fetch::{FetchThrottle, RepositoryTransport};
    use quarry::project::{Dependency, Platform, ProjectIdentity};
    use quarry::{QuarryError, QuarryResult};
    use std::collections::{BTreeSet, HashMap};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    const REVISION: &str = "0123456789abcdef";

    /// Transport serving checkouts from a table of per-project manifests
    struct FakeTransport {
        manifests: HashMap<String, String>,
    }

    #[async_trait]
    impl RepositoryTransport for FakeTransport {
        async fn is_repository(&self, path: &Path) -> bool {
            path.is_dir()
        }

        async fn clone_repository(&self, _remote: &str, destination: &Path) -> QuarryResult<()> {
            std::fs::create_dir_all(destination).map_err(|e| QuarryError::io("clone", e))
        }

        async fn fetch(&self, _repository: &Path, _remote: &str) -> QuarryResult<()> {
            Ok(())
        }

        async fn commit_exists(&self, _repository: &Path, _commitish: &str) -> QuarryResult<bool> {
            Ok(true)
        }

        async fn is_symbolic_reference(
            &self,
            _repository: &Path,
            _commitish: &str,
        ) -> QuarryResult<bool> {
            Ok(false)
        }

        async fn current_revision(&self, _repository: &Path) -> QuarryResult<String> {
            Ok(REVISION.to_string())
        }

        async fn checkout(
            &self,
            _repository: &Path,
            _commitish: &str,
            working_directory: &Path,
        ) -> QuarryResult<()> {
            std::fs::create_dir_all(working_directory).map_err(|e| QuarryError::io("checkout", e))?;
            let name = working_directory
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if let Some(manifest) = self.manifests.get(&name) {
                std::fs::write(working_directory.join("Quarryfile"), manifest)
                    .map_err(|e| QuarryError::io("checkout", e))?;
            }
            Ok(())
        }
    }

    /// Toolchain writing a deterministic artifact per scheme
    #[derive(Default)]
    struct FakeToolchain {
        builds: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Toolchain for FakeToolchain {
        async fn platforms(
            &self,
            _dependency: &Dependency,
            _checkout: &Path,
        ) -> QuarryResult<BTreeSet<Platform>> {
            Ok([Platform::Mac, Platform::IOS].into_iter().collect())
        }

        async fn build(&self, request: &BuildRequest) -> QuarryResult<()> {
            let name = request.dependency.project.name();
            std::fs::create_dir_all(&request.output).map_err(|e| QuarryError::io("build", e))?;
            std::fs::write(
                request.output.join(name),
                format!("{} for {}", name, request.platform),
            )
            .map_err(|e| QuarryError::io("build", e))?;
            self.builds
                .lock()
                .unwrap()
                .push(request.dependency.scheme_name(request.platform));
            Ok(())
        }
    }

    /// Project with dependencies A <- B <- C, plus any independent extras
    struct Fixture {
        temp: TempDir,
        root: PathBuf,
        orchestrator: BuildOrchestrator,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_dependencies(&[("C", "3.0"), ("B", "2.0"), ("A", "1.0")])
        }

        fn with_dependencies(declared: &[(&str, &str)]) -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("app");
            std::fs::create_dir_all(&root).unwrap();
            std::fs::write(
                root.join("Quarryfile"),
                declared
                    .iter()
                    .map(|(name, version)| {
                        format!(
                            "[[dependency]]\ngithub = \"acme/{}\"\nversion = \"{}\"\n",
                            name, version
                        )
                    })
                    .collect::<String>(),
            )
            .unwrap();

            let manifests = HashMap::from([
                (
                    "B".to_string(),
                    "[[dependency]]\ngithub = \"acme/A\"\nversion = \"1.0\"\n".to_string(),
                ),
                (
                    "C".to_string(),
                    "[[dependency]]\ngithub = \"acme/B\"\nversion = \"2.0\"\n".to_string(),
                ),
            ]);

            let orchestrator = BuildOrchestrator::new(
                Arc::new(FakeTransport { manifests }),
                Arc::new(FakeToolchain::default()),
                Arc::new(ContentFingerprinter),
                Arc::new(FetchThrottle::default()),
                temp.path().join("mirrors"),
            );

            Self {
                temp,
                root,
                orchestrator,
            }
        }

        fn mac_only() -> BuildOptions {
            BuildOptions {
                platforms: [Platform::Mac].into_iter().collect(),
                ..BuildOptions::default()
            }
        }

        async fn build(&self, options: BuildOptions) -> Vec<String> {
            let rx = self.orchestrator.build(&self.root, options);
            let (schemes, errors) = drain(rx).await;
            assert!(errors.is_empty(), "unexpected errors: {errors:?}");
            schemes
        }

        fn artifact(&self, name: &str, platform: Platform) -> PathBuf {
            self.root
                .join("Quarry")
                .join("Build")
                .join(platform.name())
                .join(name)
        }

        fn store(&self) -> VersionRecordStore {
            VersionRecordStore::new(self.root.join("Quarry").join("Build"))
        }
    }

    async fn drain(mut rx: mpsc::Receiver<BuildResult>) -> (Vec<String>, Vec<QuarryError>) {
        let mut schemes = Vec::new();
        let mut errors = Vec::new();
        while let Some(result) = rx.recv().await {
            match result {
                Ok(built) => schemes.push(built.scheme),
                Err(e) => errors.push(e),
            }
        }
        (schemes, errors)
    }

    fn acme(name: &str) -> ProjectIdentity {
        ProjectIdentity::parse_github(&format!("acme/{}", name)).unwrap()
    }

    #[tokio::test]
    async fn second_pass_builds_nothing() {
        let fixture = Fixture::new();

        let first = fixture.build(Fixture::mac_only()).await;
        assert_eq!(first, vec!["A-Mac", "B-Mac", "C-Mac"]);

        let second = fixture.build(Fixture::mac_only()).await;
        assert!(second.is_empty(), "rebuilt {second:?}");
        assert!(fixture.temp.path().join("mirrors").is_dir());
    }

    #[tokio::test]
    async fn changed_artifact_rebuilds_it_and_its_dependents() {
        let fixture = Fixture::new();
        fixture.build(Fixture::mac_only()).await;

        std::fs::write(fixture.artifact("B", Platform::Mac), "tampered").unwrap();

        let schemes = fixture.build(Fixture::mac_only()).await;
        assert_eq!(schemes, vec!["B-Mac", "C-Mac"]);
    }

    #[tokio::test]
    async fn changed_artifact_leaves_unrelated_dependency_alone() {
        let fixture =
            Fixture::with_dependencies(&[("C", "3.0"), ("B", "2.0"), ("A", "1.0"), ("D", "4.0")]);
        let mut first = fixture.build(Fixture::mac_only()).await;
        first.sort();
        assert_eq!(first, vec!["A-Mac", "B-Mac", "C-Mac", "D-Mac"]);

        std::fs::write(fixture.artifact("B", Platform::Mac), "tampered").unwrap();

        let schemes = fixture.build(Fixture::mac_only()).await;
        assert_eq!(schemes, vec!["B-Mac", "C-Mac"]);
        let record = fixture.store().load(&acme("D")).await.unwrap().unwrap();
        assert!(record.fingerprint(Platform::Mac).is_some());
    }

    #[tokio::test]
    async fn changed_record_commitish_forces_rebuild() {
        let fixture = Fixture::new();
        fixture.build(Fixture::mac_only()).await;

        let store = fixture.store();
        let mut record = store.load(&acme("C")).await.unwrap().unwrap();
        assert_eq!(record.commitish, REVISION);
        record.commitish = "fedcba9876543210".to_string();
        store.save(&acme("C"), &record).await.unwrap();

        let schemes = fixture.build(Fixture::mac_only()).await;
        assert_eq!(schemes, vec!["C-Mac"]);
    }

    #[tokio::test]
    async fn corrupt_record_is_rebuilt() {
        let fixture = Fixture::new();
        fixture.build(Fixture::mac_only()).await;

        std::fs::write(fixture.store().record_path(&acme("C")), "{not json").unwrap();

        let schemes = fixture.build(Fixture::mac_only()).await;
        assert_eq!(schemes, vec!["C-Mac"]);
    }

    #[tokio::test]
    async fn disabled_cache_rebuilds_everything() {
        let fixture = Fixture::new();
        fixture.build(Fixture::mac_only()).await;

        let options = BuildOptions {
            cache_builds: false,
            ..Fixture::mac_only()
        };
        let schemes = fixture.build(options).await;
        assert_eq!(schemes, vec!["A-Mac", "B-Mac", "C-Mac"]);
    }

    #[tokio::test]
    async fn one_stale_platform_rebuilds_all_platforms() {
        let fixture = Fixture::new();

        // Empty request resolves to the toolchain's platforms
        let first = fixture.build(BuildOptions::default()).await;
        assert_eq!(first.len(), 6);

        std::fs::remove_file(fixture.artifact("C", Platform::IOS)).unwrap();

        let schemes = fixture.build(BuildOptions::default()).await;
        assert_eq!(schemes, vec!["C-Mac", "C-iOS"]);
    }

    #[tokio::test]
    async fn new_platform_request_builds_missing_platform() {
        let fixture = Fixture::new();
        fixture.build(Fixture::mac_only()).await;

        let options = BuildOptions {
            platforms: [Platform::IOS].into_iter().collect(),
            ..BuildOptions::default()
        };
        let schemes = fixture.build(options).await;
        assert_eq!(schemes, vec!["A-iOS", "B-iOS", "C-iOS"]);
    }
}

mod git_tests {
    //! End-to-end builds against real git repositories.
    //!
    //! Skipped when git is not installed.

    use assert_cmd::cargo::cargo_bin_cmd;
    use predicates::prelude::*;
    use quarry::fetch::{
        CloneOrFetchCoordinator, FetchThrottle, GitTransport, ProjectEvent, RepositoryTransport,
    };
    use quarry::project::{GitProtocol, ProjectIdentity};
    use std::path::{Path, PathBuf};
    use std::process::Command;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(["-c", "user.name=Quarry", "-c", "user.email=quarry@example.com"])
            .args(args)
            .current_dir(dir)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn git_stdout(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git").args(args).current_dir(dir).output().unwrap();
        assert!(output.status.success(), "git {:?} failed", args);
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    fn commit_file(repo: &Path, name: &str, content: &str) -> String {
        std::fs::write(repo.join(name), content).unwrap();
        git(repo, &["add", name]);
        git(repo, &["commit", "--quiet", "-m", name]);
        git_stdout(repo, &["rev-parse", "HEAD"])
    }

    /// Upstream repository on branch `master` with one commit tagged `v1`
    fn upstream_repo(temp: &TempDir) -> (PathBuf, String) {
        let repo = temp.path().join("upstream");
        std::fs::create_dir_all(&repo).unwrap();
        git(&repo, &["init", "--quiet"]);
        git(&repo, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        let first = commit_file(&repo, "README", "one");
        git(&repo, &["tag", "v1"]);
        (repo, first)
    }

    fn noop(_: &ProjectEvent) {}

    #[tokio::test]
    async fn clone_or_fetch_decisions_against_git() {
        if !GitTransport::git_installed().await {
            eprintln!("git not installed, skipping");
            return;
        }

        let temp = TempDir::new().unwrap();
        let (repo, first) = upstream_repo(&temp);
        let project = ProjectIdentity::git(&repo.display().to_string()).unwrap();
        let mirror = temp.path().join("mirrors").join(project.file_key());

        let transport = Arc::new(GitTransport::new());
        let coordinator =
            CloneOrFetchCoordinator::new(transport.clone(), Arc::new(FetchThrottle::default()));
        let resolve = |commitish: Option<&str>| {
            let commitish = commitish.map(str::to_string);
            let coordinator = coordinator.clone();
            let project = project.clone();
            let mirror = mirror.clone();
            async move {
                coordinator
                    .resolve(&project, GitProtocol::Https, &mirror, commitish.as_deref(), &noop)
                    .await
                    .unwrap()
                    .event
            }
        };

        // Missing mirror is cloned
        assert_eq!(resolve(None).await, Some(ProjectEvent::Cloning(project.clone())));
        assert!(transport.is_repository(&mirror).await);
        assert!(transport.commit_exists(&mirror, &first).await.unwrap());

        // No commit-ish: fetched once, then throttled
        assert_eq!(resolve(None).await, Some(ProjectEvent::Fetching(project.clone())));
        assert_eq!(resolve(None).await, None);

        // A commit already in the mirror needs nothing
        assert!(!transport.is_symbolic_reference(&mirror, &first).await.unwrap());
        assert_eq!(resolve(Some(&first)).await, None);

        // Branches and tags may have moved, so they are always fetched
        assert!(transport.is_symbolic_reference(&mirror, "master").await.unwrap());
        assert_eq!(resolve(Some("master")).await, Some(ProjectEvent::Fetching(project.clone())));
        assert_eq!(resolve(Some("v1")).await, Some(ProjectEvent::Fetching(project.clone())));

        // An unknown commit is fetched for, even inside the throttle window
        let unknown = "0123456789012345678901234567890123456789";
        assert!(!transport.commit_exists(&mirror, unknown).await.unwrap());
        assert_eq!(resolve(Some(unknown)).await, Some(ProjectEvent::Fetching(project.clone())));
    }

    #[tokio::test]
    async fn moved_tag_is_followed_on_fetch() {
        if !GitTransport::git_installed().await {
            eprintln!("git not installed, skipping");
            return;
        }

        let temp = TempDir::new().unwrap();
        let (repo, first) = upstream_repo(&temp);
        let project = ProjectIdentity::git(&repo.display().to_string()).unwrap();
        let mirror = temp.path().join("mirrors").join(project.file_key());
        let checkout = temp.path().join("Checkouts").join(project.name());

        let transport = Arc::new(GitTransport::new());
        let coordinator =
            CloneOrFetchCoordinator::new(transport.clone(), Arc::new(FetchThrottle::default()));

        coordinator
            .resolve(&project, GitProtocol::Https, &mirror, Some("v1"), &noop)
            .await
            .unwrap();
        transport.checkout(&mirror, "v1", &checkout).await.unwrap();
        assert_eq!(transport.current_revision(&mirror).await.unwrap(), first);

        let second = commit_file(&repo, "CHANGES", "two");
        git(&repo, &["tag", "-f", "v1"]);

        let resolution = coordinator
            .resolve(&project, GitProtocol::Https, &mirror, Some("v1"), &noop)
            .await
            .unwrap();
        assert_eq!(resolution.event, Some(ProjectEvent::Fetching(project.clone())));

        transport.checkout(&mirror, "v1", &checkout).await.unwrap();
        assert_eq!(transport.current_revision(&mirror).await.unwrap(), second);
        assert!(checkout.join("CHANGES").exists());
    }

    /// Repository `Lib` tagged `v1.0` whose build script writes the artifact
    fn library_repo(temp: &TempDir) -> std::path::PathBuf {
        let repo = temp.path().join("Lib");
        std::fs::create_dir_all(&repo).unwrap();
        git(&repo, &["init", "--quiet"]);
        std::fs::write(
            repo.join("build.sh"),
            "mkdir -p \"$QUARRY_OUTPUT\"\necho \"Lib $QUARRY_PLATFORM\" > \"$QUARRY_OUTPUT/Lib\"\n",
        )
        .unwrap();
        git(&repo, &["add", "build.sh"]);
        git(&repo, &["commit", "--quiet", "-m", "Initial"]);
        git(&repo, &["tag", "v1.0"]);
        repo
    }

    #[tokio::test]
    async fn builds_git_dependency_once() {
        if !GitTransport::git_installed().await {
            eprintln!("git not installed, skipping");
            return;
        }

        let temp = TempDir::new().unwrap();
        let repo = library_repo(&temp);

        let app = temp.path().join("app");
        std::fs::create_dir_all(&app).unwrap();
        std::fs::write(
            app.join("Quarryfile"),
            format!(
                "[[dependency]]\ngit = \"{}\"\nversion = \"v1.0\"\n",
                repo.display()
            ),
        )
        .unwrap();

        let config = temp.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[fetch]\nmirror_dir = \"{}\"\n\n[build]\nplatforms = [\"Mac\"]\ncommand = [\"sh\", \"build.sh\"]\n",
                temp.path().join("mirrors").display()
            ),
        )
        .unwrap();

        let run = || {
            let mut cmd = cargo_bin_cmd!("quarry");
            cmd.arg("--no-local")
                .arg("--config")
                .arg(&config)
                .arg("build")
                .arg("--project-directory")
                .arg(&app);
            cmd
        };

        run()
            .assert()
            .success()
            .stdout(predicate::str::contains("Building scheme \"Lib-Mac\""));

        let artifact = app.join("Quarry/Build/Mac/Lib");
        assert_eq!(std::fs::read_to_string(artifact).unwrap().trim(), "Lib Mac");
        assert!(app.join("Quarry/Checkouts/Lib/build.sh").exists());

        run()
            .assert()
            .success()
            .stdout(predicate::str::contains("up to date"));
    }
}
