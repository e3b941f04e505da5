//! Terminal host
//!
//! The CLI has no view into browser tabs. [`SystemTabs`] reports none, so
//! opening a bookmark always ends in "create a new tab", which hands the deep
//! link to the system URL handler (or a configured opener command). Text is
//! copied through the system clipboard, or a configured clipboard command,
//! with an OSC 52 escape sequence as the terminal fallback.

use std::io::IsTerminal;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};

use base64::Engine;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{Result, SaverError};
use crate::platform::{Clipboard, JumpResponse, RuntimeMessage, Tab, TabId, TabQuery, TabUpdate, Tabs};

/// [`Tabs`] that can only open new tabs
#[derive(Debug)]
pub struct SystemTabs {
    opener: Option<Vec<String>>,
    next_id: AtomicI64,
}

impl SystemTabs {
    /// Open URLs with `opener` (program followed by leading arguments), or
    /// with the system URL handler when `None`.
    pub fn new(opener: Option<Vec<String>>) -> Self {
        Self {
            opener,
            next_id: AtomicI64::new(1),
        }
    }

    async fn run_opener(opener: &[String], url: &str) -> Result<()> {
        let (program, args) = opener
            .split_first()
            .ok_or_else(|| SaverError::Config("Opener command is empty".to_string()))?;

        tracing::info!(opener = %program, url, "Opening URL");
        let status = Command::new(program)
            .args(args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| SaverError::Tab(format!("Failed to run {}: {}", program, e)))?;

        if !status.success() {
            return Err(SaverError::Tab(format!("{} exited with {}", program, status)).into());
        }
        Ok(())
    }

    async fn open_with_system(url: &str) -> Result<()> {
        tracing::info!(url, "Opening URL with the system handler");
        let target = url.to_string();
        tokio::task::spawn_blocking(move || open::that(&target))
            .await
            .map_err(|e| SaverError::Tab(format!("URL opener task failed: {}", e)))?
            .map_err(|e| SaverError::Tab(format!("Failed to open URL: {}", e)).into())
    }
}

#[async_trait::async_trait]
impl Tabs for SystemTabs {
    async fn query(&self, _query: TabQuery) -> Result<Vec<Tab>> {
        Ok(Vec::new())
    }

    async fn update(&self, tab: TabId, _update: TabUpdate) -> Result<()> {
        Err(SaverError::Tab(format!("Cannot update tab {} from the terminal", tab)).into())
    }

    async fn create(&self, url: &str) -> Result<Tab> {
        match &self.opener {
            Some(opener) => Self::run_opener(opener, url).await?,
            None => Self::open_with_system(url).await?,
        }

        Ok(Tab {
            id: TabId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            url: Some(url.to_string()),
            active: true,
        })
    }

    async fn send_message(&self, tab: TabId, _message: &RuntimeMessage) -> Result<JumpResponse> {
        Err(SaverError::Channel(format!("No page agent reachable in tab {}", tab)).into())
    }
}

/// [`Clipboard`] backed by the system clipboard (`arboard`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

#[async_trait::async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new()?;
            clipboard.set_text(text)
        })
        .await
        .map_err(|e| SaverError::Clipboard(format!("Clipboard task failed: {}", e)))?
        .map_err(|e| SaverError::Clipboard(format!("Failed to set clipboard text: {}", e)).into())
    }
}

/// [`Clipboard`] that pipes text into a configured command
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    command: Vec<String>,
}

impl CommandClipboard {
    /// Use `command` (program followed by its arguments).
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait::async_trait]
impl Clipboard for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| SaverError::Clipboard("Clipboard command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| SaverError::Clipboard(format!("Failed to run {}: {}", program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(SaverError::Io)?;
            stdin.shutdown().await.map_err(SaverError::Io)?;
        }

        let status = child.wait().await.map_err(SaverError::Io)?;
        if !status.success() {
            return Err(SaverError::Clipboard(format!("{} exited with {}", program, status)).into());
        }
        Ok(())
    }
}

/// [`Clipboard`] that asks the terminal to copy via an OSC 52 sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    /// The escape sequence that copies `text`.
    pub fn sequence(text: &str) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
        format!("\x1b]52;c;{}\x07", payload)
    }
}

#[async_trait::async_trait]
impl Clipboard for Osc52Clipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if !std::io::stdout().is_terminal() {
            return Err(SaverError::Clipboard("stdout is not a terminal".to_string()).into());
        }
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(Self::sequence(text).as_bytes())
            .await
            .map_err(SaverError::Io)?;
        stdout.flush().await.map_err(SaverError::Io)?;
        Ok(())
    }
}
