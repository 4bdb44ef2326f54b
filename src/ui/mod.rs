//! UI module for consistent CLI output
//!
//! Uses `cliclack` log lines in interactive terminals, with automatic
//! fallback to plain tagged lines in CI and when output is piped.

mod context;
mod output;
mod theme;

pub use context::UiContext;
pub use output::{
    build_outro, dependency_failed, intro, outro_error, outro_success, project_event,
    scheme_started, step_error, step_ok_detail, step_warn_hint,
};
pub use theme::{init_theme, QuarryTheme};
