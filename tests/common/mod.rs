use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use gpt_saver::config::Config;
use gpt_saver::page::{MemoryDom, PageAgent};
use gpt_saver::platform::fake::FakeTabs;
use gpt_saver::platform::{page_channel, TabId};
use gpt_saver::storage::{BookmarkStore, SledStore};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[allow(dead_code)]
pub const TEST_HOST_PATTERN: &str = r"https?://(chat\.openai|chatgpt|chat\.example)\.com/";

#[allow(dead_code)]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.host.url_pattern = TEST_HOST_PATTERN.to_string();
    config
}

#[allow(dead_code)]
pub fn create_temp_sled() -> (Arc<SledStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = SledStore::open(tmp.path().join("bookmarks.sled")).expect("failed to open sled");
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// A page agent running in a fake tab
#[allow(dead_code)]
pub struct RunningPage {
    pub dom: Arc<MemoryDom>,
    pub agent: Arc<PageAgent>,
    pub tab: TabId,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<()>,
}

#[allow(dead_code)]
impl RunningPage {
    pub async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.expect("page agent panicked");
    }
}

/// Open `url` in a new active tab of `tabs` and start a page agent there.
#[allow(dead_code)]
pub fn open_page(
    tabs: &FakeTabs,
    url: &str,
    store: BookmarkStore,
    messages: &[&str],
) -> RunningPage {
    let dom = Arc::new(MemoryDom::new(url));
    for text in messages {
        dom.push_message("user", text);
        dom.push_message("assistant", "...");
    }
    let agent = Arc::new(PageAgent::new(dom.clone(), store, test_config().page));
    let (port, inbox) = page_channel(8);
    let tab = tabs.add_tab(url, true);
    tabs.connect(tab, port);

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(Arc::clone(&agent).run(inbox, shutdown.clone()));
    RunningPage {
        dom,
        agent,
        tab,
        shutdown,
        handle,
    }
}
