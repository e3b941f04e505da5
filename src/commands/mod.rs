/*!
Command handlers for the CLI

Each subcommand resolves the desktop [`Platform`], builds a
[`ControlSurface`] that renders to the terminal, and calls the matching
surface operation.

- `terminal`: terminal view and confirmation prompt
- `transfer`: import/export of the bookmark collection
*/

use std::sync::Arc;

use colored::Colorize;

use crate::bookmark::Bookmark;
use crate::cli::{Commands, ThemeCommand};
use crate::config::Config;
use crate::control::{AlwaysConfirm, Confirm, ControlSurface, OpenOutcome};
use crate::error::{Result, SaverError};
use crate::platform::Platform;

pub mod terminal;
pub mod transfer;

use terminal::{PromptConfirm, TerminalView};

/// Run `command` against the desktop host described by `config`.
pub async fn run(command: Commands, config: Config) -> Result<()> {
    let platform = Platform::desktop(&config)?;
    let view = Arc::new(TerminalView::new(config.desktop.prefers_dark));
    let surface = ControlSurface::new(platform, view, &config)?;
    execute(command, &surface, &PromptConfirm).await
}

/// Run `command` against an already built surface.
///
/// `confirm` answers the delete prompt unless `--yes` was given.
pub async fn execute(
    command: Commands,
    surface: &ControlSurface,
    confirm: &dyn Confirm,
) -> Result<()> {
    match command {
        Commands::List { json } => {
            if json {
                let mut bookmarks = surface.store().list().await?;
                bookmarks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                let json =
                    serde_json::to_string_pretty(&bookmarks).map_err(SaverError::Serialization)?;
                println!("{}", json);
            } else {
                surface.start().await?;
            }
        }
        Commands::Link { id } => {
            let bookmark = find(surface, &id).await?;
            println!("{}", bookmark.deep_link());
            surface.copy_link(&bookmark).await;
        }
        Commands::Open { id } => {
            let bookmark = find(surface, &id).await?;
            match surface.open_bookmark(&bookmark).await {
                OpenOutcome::Failed => {
                    return Err(SaverError::Tab(format!(
                        "Could not open {}",
                        bookmark.deep_link()
                    ))
                    .into());
                }
                outcome => tracing::debug!(outcome = ?outcome, "Open finished"),
            }
            println!("Opened {}", bookmark.deep_link().cyan());
        }
        Commands::Delete { id, yes } => {
            find(surface, &id).await?;
            let confirm: &dyn Confirm = if yes { &AlwaysConfirm } else { confirm };
            if !surface.delete_bookmark(&id, confirm).await? {
                println!("{}", "Cancelled".yellow());
            }
        }
        Commands::Theme { action } => {
            let applied = surface.apply_stored_theme().await;
            match action.unwrap_or(ThemeCommand::Show) {
                ThemeCommand::Show => println!("Theme: {}", applied.to_string().bold()),
                ThemeCommand::Toggle => {
                    let next = surface.toggle_theme().await?;
                    println!("Theme: {}", next.to_string().bold());
                }
            }
        }
        Commands::Import { file } => {
            let added = transfer::import_file(surface.store(), &file).await?;
            println!(
                "{}",
                format!("Imported {} bookmark(s) from {}", added, file.display()).green()
            );
        }
        Commands::Export { file } => {
            let json = transfer::export_json(surface.store()).await?;
            match file {
                Some(path) => {
                    tokio::fs::write(&path, json).await.map_err(SaverError::Io)?;
                    println!("{}", format!("Exported to {}", path.display()).green());
                }
                None => println!("{}", json),
            }
        }
    }

    Ok(())
}

async fn find(surface: &ControlSurface, id: &str) -> Result<Bookmark> {
    surface
        .store()
        .find(id)
        .await?
        .ok_or_else(|| SaverError::BookmarkNotFound(id.to_string()).into())
}
