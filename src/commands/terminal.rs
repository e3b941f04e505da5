//! Terminal rendering for the control surface

use std::sync::Mutex;

use colored::Colorize;
use prettytable::{format, Table};
use rustyline::DefaultEditor;

use crate::control::{BookmarkRow, Confirm, SurfaceView, Theme};

/// Width of the snippet column before it is cut.
const SNIPPET_COLUMN_CHARS: usize = 60;

/// Guess the terminal background from `COLORFGBG` (`"fg;bg"`).
///
/// Background colours 0-6 and 8 are dark. Without the variable the terminal
/// is assumed to be dark.
pub fn terminal_prefers_dark(colorfgbg: Option<&str>) -> bool {
    let Some(value) = colorfgbg else {
        return true;
    };
    match value.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()) {
        Some(bg) => bg < 7 || bg == 8,
        None => true,
    }
}

/// [`SurfaceView`] that prints to the terminal
#[derive(Debug)]
pub struct TerminalView {
    prefers_dark: bool,
    theme: Mutex<Option<Theme>>,
}

impl TerminalView {
    /// Create a view; `prefers_dark` overrides terminal detection.
    pub fn new(prefers_dark: Option<bool>) -> Self {
        let detected = std::env::var("COLORFGBG").ok();
        Self {
            prefers_dark: prefers_dark
                .unwrap_or_else(|| terminal_prefers_dark(detected.as_deref())),
            theme: Mutex::new(None),
        }
    }

    fn current_theme(&self) -> Theme {
        self.applied_theme().unwrap_or(Theme::Dark)
    }
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

impl SurfaceView for TerminalView {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    fn apply_theme(&self, theme: Theme) {
        if let Ok(mut current) = self.theme.lock() {
            *current = Some(theme);
        }
    }

    fn applied_theme(&self) -> Option<Theme> {
        self.theme.lock().ok().and_then(|t| *t)
    }

    fn show_loading(&self) {
        eprintln!("{}", "Loading…".dimmed());
    }

    fn render_rows(&self, rows: &[BookmarkRow]) {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.add_row(prettytable::row![
            "ID".bold(),
            "Saved".bold(),
            "Message".bold()
        ]);

        let theme = self.current_theme();
        for row in rows {
            let id = match theme {
                Theme::Dark => row.id.cyan(),
                Theme::Light => row.id.blue(),
            };
            table.add_row(prettytable::row![
                id,
                row.created,
                shorten(&row.snippet, SNIPPET_COLUMN_CHARS)
            ]);
        }

        println!("\nSaved messages:");
        table.printstd();
        println!();
        println!(
            "Use {} to jump back to a message.",
            "gpt-saver open <ID>".cyan()
        );
        println!();
    }

    fn render_placeholder(&self, message: &str) {
        println!("{}", message.yellow());
    }

    fn show_toast(&self, message: &str) {
        println!("{}", message.green());
    }

    // Printed lines cannot be taken back.
    fn hide_toast(&self) {}
}

/// [`Confirm`] that asks on the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptConfirm;

impl Confirm for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::warn!("Cannot prompt for confirmation: {}", e);
                return false;
            }
        };
        match rl.readline(&format!("{} [y/N] ", prompt)) {
            Ok(answer) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
