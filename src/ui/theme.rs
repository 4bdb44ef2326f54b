//! Theme for cliclack output
//!
//! Repository events are logged as info lines and scheme builds as steps;
//! the symbols make the two easy to tell apart in a long build pass.

use cliclack::ThemeState;
use console::{style, Style};

/// Marks clone, fetch and checkout lines
const EVENT_SYMBOL: &str = "↓";

/// Marks scheme builds
const BUILD_SYMBOL: &str = "▲";

/// Quarry's theme with cyan branding
#[derive(Debug, Clone, Default)]
pub struct QuarryTheme;

impl cliclack::Theme for QuarryTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().cyan(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().cyan().dim(),
        }
    }

    fn info_symbol(&self) -> String {
        style(EVENT_SYMBOL).cyan().to_string()
    }

    fn submit_symbol(&self) -> String {
        style(BUILD_SYMBOL).green().to_string()
    }
}

/// Initialize the global theme
pub fn init_theme() {
    cliclack::set_theme(QuarryTheme);
}
