mod common;

use std::sync::Arc;

use common::{create_temp_sled, temp_config_file, test_config};
use gpt_saver::cli::{Cli, Commands, ThemeCommand};
use gpt_saver::commands::{execute, transfer};
use gpt_saver::control::{load_theme, ControlSurface, MemoryView, NeverConfirm, Theme};
use gpt_saver::platform::fake::{FakeTabs, RecordingClipboard, TabCall};
use gpt_saver::platform::{Clipboard, ClipboardChain, Platform};
use gpt_saver::storage::SledStore;
use gpt_saver::{Bookmark, Config, SaverError};
use tempfile::TempDir;

struct CliHarness {
    surface: ControlSurface,
    tabs: Arc<FakeTabs>,
    clipboard: Arc<RecordingClipboard>,
    kv: Arc<SledStore>,
    _tmp: TempDir,
}

fn cli_surface() -> CliHarness {
    let (kv, tmp) = create_temp_sled();
    let tabs = Arc::new(FakeTabs::new());
    let clipboard = Arc::new(RecordingClipboard::new());
    let platform = Platform::new(
        kv.clone(),
        tabs.clone(),
        ClipboardChain::new(Some(clipboard.clone() as Arc<dyn Clipboard>), None),
    );
    let surface =
        ControlSurface::new(platform, Arc::new(MemoryView::new(true)), &test_config()).unwrap();
    CliHarness {
        surface,
        tabs,
        clipboard,
        kv,
        _tmp: tmp,
    }
}

async fn seed(surface: &ControlSurface) -> Bookmark {
    let bm = Bookmark::capture("https://chatgpt.com/c/55", 0, "seeded message");
    surface.store().add(bm.clone()).await.unwrap();
    bm
}

#[tokio::test]
async fn test_link_copies_deep_link() {
    let cli = cli_surface();
    let bm = seed(&cli.surface).await;
    execute(
        Commands::Link { id: bm.id.clone() },
        &cli.surface,
        &NeverConfirm,
    )
    .await
    .unwrap();
    assert_eq!(cli.clipboard.copied(), vec![bm.deep_link()]);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let cli = cli_surface();
    let err = execute(
        Commands::Open {
            id: "bm-missing".to_string(),
        },
        &cli.surface,
        &NeverConfirm,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SaverError>(),
        Some(SaverError::BookmarkNotFound(_))
    ));
}

#[tokio::test]
async fn test_open_without_tabs_creates_one() {
    let cli = cli_surface();
    let bm = seed(&cli.surface).await;
    execute(Commands::Open { id: bm.id.clone() }, &cli.surface, &NeverConfirm)
        .await
        .unwrap();
    assert!(cli.tabs.calls().contains(&TabCall::Create(bm.deep_link())));
}

#[tokio::test]
async fn test_delete_respects_confirmation_and_yes_flag() {
    let cli = cli_surface();
    let bm = seed(&cli.surface).await;

    execute(
        Commands::Delete {
            id: bm.id.clone(),
            yes: false,
        },
        &cli.surface,
        &NeverConfirm,
    )
    .await
    .unwrap();
    assert_eq!(cli.surface.store().list().await.unwrap().len(), 1);

    execute(
        Commands::Delete {
            id: bm.id.clone(),
            yes: true,
        },
        &cli.surface,
        &NeverConfirm,
    )
    .await
    .unwrap();
    assert!(cli.surface.store().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_theme_toggle_persists() {
    let cli = cli_surface();
    execute(
        Commands::Theme {
            action: Some(ThemeCommand::Toggle),
        },
        &cli.surface,
        &NeverConfirm,
    )
    .await
    .unwrap();
    assert_eq!(load_theme(cli.kv.as_ref()).await.unwrap(), Some(Theme::Light));
}

#[tokio::test]
async fn test_export_then_import_into_another_store() {
    let source = cli_surface();
    seed(&source.surface).await;
    seed(&source.surface).await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bookmarks.json");
    execute(
        Commands::Export {
            file: Some(file.clone()),
        },
        &source.surface,
        &NeverConfirm,
    )
    .await
    .unwrap();

    let target = cli_surface();
    execute(Commands::Import { file: file.clone() }, &target.surface, &NeverConfirm)
        .await
        .unwrap();
    assert_eq!(
        target.surface.store().list().await.unwrap(),
        source.surface.store().list().await.unwrap()
    );
    assert_eq!(transfer::import_file(target.surface.store(), &file).await.unwrap(), 0);
}

#[test]
fn test_config_file_overrides_defaults() {
    let (_dir, path) = temp_config_file(
        "page:\n  highlight_ms: 2500\ncontrol:\n  toast_ms: 900\n",
    );
    let config = Config::load(path.to_str(), &Cli::default()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.page.highlight_ms, 2500);
    assert_eq!(config.control.toast_ms, 900);
    assert_eq!(config.page.deep_link_delay_ms, 2000);
}
