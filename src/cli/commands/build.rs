//! Build command - fetch, check out and build dependencies

use crate::build::{BuildOptions, BuildOrchestrator, CommandToolchain};
use crate::cache::ContentFingerprinter;
use crate::cli::args::BuildArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{QuarryError, QuarryResult};
use crate::fetch::{FetchThrottle, GitTransport, ProjectEvent};
use crate::ui::{self, UiContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Execute the build command
pub async fn execute(args: BuildArgs, config: &Config) -> QuarryResult<()> {
    let ctx = UiContext::detect();

    let root = match args.project_directory {
        Some(dir) => dir,
        None => std::env::current_dir()
            .map_err(|e| QuarryError::io("getting current directory", e))?,
    };

    let mut options = BuildOptions::from_config(&config.build);
    if !args.platforms.is_empty() {
        options.platforms = args.platforms.into_iter().collect();
    }
    if let Some(configuration) = args.configuration {
        options.configuration = configuration;
    }
    if args.no_cache_builds {
        options.cache_builds = false;
    }
    debug!("Build options: {:?}", options);

    let throttle = Arc::new(FetchThrottle::new(Duration::from_secs(
        config.fetch.throttle_secs,
    )));
    let event_ctx = ctx.clone();
    let orchestrator = BuildOrchestrator::new(
        Arc::new(GitTransport::new()),
        Arc::new(CommandToolchain::new(config.build.command.clone())),
        Arc::new(ContentFingerprinter),
        throttle,
        ConfigManager::mirror_dir(config),
    )
    .with_protocol(config.fetch.protocol)
    .with_event_handler(Arc::new(move |event: &ProjectEvent| {
        ui::project_event(&event_ctx, event)
    }));

    ui::intro(&ctx, &format!("Building dependencies of {}", root.display()));
    let mut results = orchestrator.build(root, options);
    let mut built = 0usize;
    let mut failed = 0usize;
    let mut fatal: Option<QuarryError> = None;

    while let Some(result) = results.recv().await {
        match result {
            Ok(scheme) => {
                built += 1;
                ui::scheme_started(&ctx, &scheme);
            }
            Err(e) if is_pipeline_error(&e) => {
                failed += 1;
                ui::dependency_failed(&ctx, &e);
            }
            Err(e) if fatal.is_none() => fatal = Some(e),
            Err(e) => ui::step_error(&ctx, &e.to_string()),
        }
    }

    if let Some(e) = fatal {
        return Err(e);
    }

    ui::build_outro(&ctx, built, failed);
    if failed > 0 {
        return Err(QuarryError::User(format!(
            "{} of the dependencies could not be built",
            failed
        )));
    }

    Ok(())
}

/// Errors that fail one dependency rather than the whole pass
fn is_pipeline_error(error: &QuarryError) -> bool {
    !matches!(error, QuarryError::DependencyCycle(_)) && error.project().is_some()
}
