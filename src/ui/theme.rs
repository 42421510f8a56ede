use owo_colors::{OwoColorize, Style};
use std::sync::OnceLock;
use crate::ui::Icons;

static THEME: OnceLock<Theme> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
    pub done: Style,
    /// Whether list colors are painted as truecolor swatches
    pub swatches: bool,
}

impl Theme {
    pub fn detect() -> Self {
        if !console::Term::stdout().is_term() {
            return Self::plain();
        }
        Self::colored()
    }

    pub fn colored() -> Self {
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
            done: Style::new().bright_black().strikethrough(),
            swatches: true,
        }
    }

    pub fn plain() -> Self {
        Self {
            header: Style::new(),
            success: Style::new(),
            warn: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            done: Style::new(),
            swatches: false,
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::detect)
}

/// A dot in the list's ARGB color, or the plain dot without a terminal.
pub fn swatch(color: i32) -> String {
    if !theme().swatches {
        return Icons::DOT.to_string();
    }
    let argb = color as u32;
    let (r, g, b) = ((argb >> 16) as u8, (argb >> 8) as u8, argb as u8);
    Icons::DOT.truecolor(r, g, b).to_string()
}
