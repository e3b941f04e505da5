//! Command-line interface definition for gpt-saver
//!
//! The CLI is a terminal control surface: it lists, copies, opens and
//! deletes stored bookmarks and manages the theme preference.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gpt-saver - bookmarks for individual chat messages
#[derive(Parser, Debug, Clone)]
#[command(name = "gpt-saver")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the bookmark database location
    #[arg(long, value_name = "PATH")]
    pub storage_path: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List saved bookmarks, newest first
    List {
        /// Print the stored records as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Copy the deep link of a bookmark to the clipboard
    Link {
        /// Bookmark id
        id: String,
    },

    /// Open the conversation of a bookmark at the saved message
    Open {
        /// Bookmark id
        id: String,
    },

    /// Delete a bookmark
    Delete {
        /// Bookmark id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show or toggle the display theme
    Theme {
        /// Theme action (defaults to `show`)
        #[command(subcommand)]
        action: Option<ThemeCommand>,
    },

    /// Merge bookmarks from a JSON export into the store
    Import {
        /// File holding a JSON array of bookmark records
        file: PathBuf,
    },

    /// Write all bookmarks as a JSON array
    Export {
        /// Output file (stdout when omitted)
        file: Option<PathBuf>,
    },
}

/// Theme subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeCommand {
    /// Print the theme that would be applied
    Show,
    /// Flip between dark and light and persist the choice
    Toggle,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            verbose: false,
            storage_path: None,
            command: Commands::List { json: false },
        }
    }
}
