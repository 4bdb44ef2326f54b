//! Output functions for build passes and config commands
//!
//! Interactive terminals get cliclack log lines; everything else gets one
//! plain line per item with a bracketed tag.

use super::context::UiContext;
use crate::build::BuiltScheme;
use crate::error::QuarryError;
use crate::fetch::ProjectEvent;
use console::style;

/// Display intro banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).cyan().bold()).ok();
    } else {
        println!("{}", style(title).cyan().bold());
    }
}

/// Display success outro
pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", style("[OK]").green(), message);
    }
}

/// Display error outro
pub fn outro_error(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).red().bold()).ok();
    } else {
        println!("{} {}", style("[ERROR]").red(), message);
    }
}

/// Display a success step with detail
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(format!("{} ({})", message, style(detail).dim())).ok();
    } else {
        println!("  {} {} ({})", style("[OK]").green(), message, detail);
    }
}

/// Display a warning step with hint
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(format!("{} - {}", message, style(hint).dim())).ok();
    } else {
        println!("  {} {} - {}", style("[WARN]").yellow(), message, hint);
    }
}

/// Display an error that does not belong to one dependency
pub fn step_error(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::error(message).ok();
    } else {
        println!("  {} {}", style("[FAIL]").red(), message);
    }
}

/// Plain-output tag for a repository event
fn event_tag(event: &ProjectEvent) -> &'static str {
    match event {
        ProjectEvent::Cloning(_) => "[CLONE]",
        ProjectEvent::Fetching(_) => "[FETCH]",
        ProjectEvent::CheckingOut(..) => "[CHECKOUT]",
    }
}

/// Display a clone, fetch or checkout of a dependency
pub fn project_event(ctx: &UiContext, event: &ProjectEvent) {
    if ctx.use_fancy_output() {
        cliclack::log::info(format!("{} {}", event, style(event.project()).dim())).ok();
    } else {
        println!("  {} {}", style(event_tag(event)).cyan(), event);
    }
}

fn scheme_line(scheme: &BuiltScheme) -> String {
    format!("Building scheme \"{}\" in {}", scheme.scheme, scheme.project)
}

/// Display a scheme build that is about to start
pub fn scheme_started(ctx: &UiContext, scheme: &BuiltScheme) {
    if ctx.use_fancy_output() {
        cliclack::log::step(scheme_line(scheme)).ok();
    } else {
        println!("  {} {}", style("[BUILD]").green(), scheme_line(scheme));
    }
}

/// Display a failure of one dependency.
///
/// Errors wrapped with their dependency are shown as `<project>: <cause>`
/// without repeating the project.
pub fn dependency_failed(ctx: &UiContext, error: &QuarryError) {
    let (project, cause) = match error {
        QuarryError::PipelineFailed { project, source } => {
            (project.to_string(), source.to_string())
        }
        other => (
            other.project().map(ToString::to_string).unwrap_or_default(),
            other.to_string(),
        ),
    };

    if ctx.use_fancy_output() {
        cliclack::log::error(format!("{}: {}", project, style(cause).red())).ok();
    } else {
        println!("  {} {}: {}", style("[FAIL]").red(), project, cause);
    }
}

/// Closing line of a build pass
pub fn build_outro(ctx: &UiContext, built: usize, failed: usize) {
    match (built, failed) {
        (_, failed) if failed > 0 => {
            outro_error(ctx, &format!("{} dependencies failed", failed))
        }
        (0, _) => outro_success(ctx, "All dependencies are up to date"),
        (1, _) => outro_success(ctx, "Built 1 scheme"),
        (built, _) => outro_success(ctx, &format!("Built {} schemes", built)),
    }
}
