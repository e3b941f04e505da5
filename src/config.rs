//! Configuration management for gpt-saver
//!
//! Configuration is layered: built-in defaults, then an optional YAML file,
//! then `GPT_SAVER_*` environment variables, then CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SaverError};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which pages count as the chat host
    #[serde(default)]
    pub host: HostConfig,
    /// Page agent timings
    #[serde(default)]
    pub page: PageConfig,
    /// Control surface settings
    #[serde(default)]
    pub control: ControlConfig,
    /// Bookmark storage location
    #[serde(default)]
    pub storage: StorageConfig,
    /// Terminal host integration
    #[serde(default)]
    pub desktop: DesktopConfig,
}

/// Chat host recognition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Regex a tab URL must match to be treated as a chat page
    #[serde(default = "default_url_pattern")]
    pub url_pattern: String,
}

fn default_url_pattern() -> String {
    r"https?://(chat\.openai|chatgpt)\.com/".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            url_pattern: default_url_pattern(),
        }
    }
}

impl HostConfig {
    /// Compile the host URL pattern.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Config` if the pattern is not a valid regex.
    pub fn matcher(&self) -> Result<Regex> {
        Regex::new(&self.url_pattern).map_err(|e| {
            SaverError::Config(format!("Invalid host.url_pattern '{}': {}", self.url_pattern, e))
                .into()
        })
    }
}

/// Page agent timings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// How long the save highlight stays on (milliseconds)
    #[serde(default = "default_save_feedback_ms")]
    pub save_feedback_ms: u64,

    /// Wait before resolving a deep link on page load (milliseconds)
    #[serde(default = "default_deep_link_delay_ms")]
    pub deep_link_delay_ms: u64,

    /// How long a jump highlight stays on (milliseconds)
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,

    /// Polls for messages before a jump gives up
    #[serde(default = "default_jump_max_attempts")]
    pub jump_max_attempts: u32,

    /// Delay between jump polls (milliseconds)
    #[serde(default = "default_jump_retry_delay_ms")]
    pub jump_retry_delay_ms: u64,
}

fn default_save_feedback_ms() -> u64 {
    1500
}

fn default_deep_link_delay_ms() -> u64 {
    2000
}

fn default_highlight_ms() -> u64 {
    4000
}

fn default_jump_max_attempts() -> u32 {
    8
}

fn default_jump_retry_delay_ms() -> u64 {
    400
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            save_feedback_ms: default_save_feedback_ms(),
            deep_link_delay_ms: default_deep_link_delay_ms(),
            highlight_ms: default_highlight_ms(),
            jump_max_attempts: default_jump_max_attempts(),
            jump_retry_delay_ms: default_jump_retry_delay_ms(),
        }
    }
}

impl PageConfig {
    /// Save highlight duration.
    pub fn save_feedback(&self) -> Duration {
        Duration::from_millis(self.save_feedback_ms)
    }

    /// Deep-link settle delay.
    pub fn deep_link_delay(&self) -> Duration {
        Duration::from_millis(self.deep_link_delay_ms)
    }

    /// Jump highlight duration.
    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    /// Delay between jump polls.
    pub fn jump_retry_delay(&self) -> Duration {
        Duration::from_millis(self.jump_retry_delay_ms)
    }
}

/// Control surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Toast auto-dismiss delay (milliseconds)
    #[serde(default = "default_toast_ms")]
    pub toast_ms: u64,
}

fn default_toast_ms() -> u64 {
    1400
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            toast_ms: default_toast_ms(),
        }
    }
}

impl ControlConfig {
    /// Toast auto-dismiss delay.
    pub fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

/// Bookmark storage location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database path; the user data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Terminal host integration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DesktopConfig {
    /// Command used to open URLs; the system URL handler when unset
    #[serde(default)]
    pub opener: Option<String>,

    /// Command that receives text to copy on stdin; the system clipboard
    /// when unset
    #[serde(default)]
    pub clipboard_command: Option<String>,

    /// Overrides the detected system dark/light preference
    #[serde(default)]
    pub prefers_dark: Option<bool>,
}

/// Split a configured command with shell quoting rules.
fn split_command(field: &str, command: &str) -> Result<Vec<String>> {
    let parts = shell_words::split(command)
        .map_err(|e| SaverError::Config(format!("Invalid {} '{}': {}", field, command, e)))?;
    if parts.is_empty() {
        return Err(SaverError::Config(format!("{} cannot be empty", field)).into());
    }
    Ok(parts)
}

impl DesktopConfig {
    /// Opener command split into program and arguments, if one is set.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Config` if the command is blank or badly quoted.
    pub fn opener_command(&self) -> Result<Option<Vec<String>>> {
        self.opener
            .as_deref()
            .map(|cmd| split_command("desktop.opener", cmd))
            .transpose()
    }

    /// Clipboard command split into program and arguments, if one is set.
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Config` if the command is blank or badly quoted.
    pub fn clipboard_command(&self) -> Result<Option<Vec<String>>> {
        self.clipboard_command
            .as_deref()
            .map(|cmd| split_command("desktop.clipboard_command", cmd))
            .transpose()
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit config file; the user config directory when `None`
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if an existing file cannot be read or parsed
    pub fn load(path: Option<&str>, cli: &crate::cli::Cli) -> Result<Self> {
        let resolved = path.map(PathBuf::from).or_else(Self::default_path);

        let mut config = match resolved {
            Some(ref file) if file.exists() => Self::from_file(file)?,
            Some(ref file) => {
                if path.is_some() {
                    tracing::warn!("Config file not found at {}, using defaults", file.display());
                } else {
                    tracing::debug!("No config file at {}, using defaults", file.display());
                }
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Default config file location in the user's config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "gpt-saver", "gpt-saver")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(SaverError::Io)?;
        serde_yaml::from_str(&contents).map_err(|e| SaverError::Yaml(e).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(path) = std::env::var("GPT_SAVER_STORAGE_PATH") {
            tracing::debug!(path = %path, "Env override: GPT_SAVER_STORAGE_PATH");
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Ok(pattern) = std::env::var("GPT_SAVER_HOST_PATTERN") {
            tracing::debug!(pattern = %pattern, "Env override: GPT_SAVER_HOST_PATTERN");
            self.host.url_pattern = pattern;
        }

        if let Ok(opener) = std::env::var("GPT_SAVER_OPENER") {
            tracing::debug!(opener = %opener, "Env override: GPT_SAVER_OPENER");
            self.desktop.opener = Some(opener);
        }

        if let Ok(command) = std::env::var("GPT_SAVER_CLIPBOARD_COMMAND") {
            tracing::debug!(command = %command, "Env override: GPT_SAVER_CLIPBOARD_COMMAND");
            self.desktop.clipboard_command = Some(command);
        }

        if let Ok(toast_ms) = std::env::var("GPT_SAVER_TOAST_MS") {
            match toast_ms.parse::<u64>() {
                Ok(v) => {
                    self.control.toast_ms = v;
                    tracing::debug!(toast_ms = v, "Env override: GPT_SAVER_TOAST_MS");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for GPT_SAVER_TOAST_MS: {}", toast_ms);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(path) = &cli.storage_path {
            tracing::debug!(path = %path.display(), "CLI override: --storage-path");
            self.storage.path = Some(path.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `SaverError::Config` if any value is unusable
    pub fn validate(&self) -> Result<()> {
        self.host.matcher()?;

        if self.page.jump_max_attempts == 0 {
            return Err(SaverError::Config(
                "page.jump_max_attempts must be greater than 0".to_string(),
            )
            .into());
        }

        if self.page.jump_retry_delay_ms == 0 {
            return Err(SaverError::Config(
                "page.jump_retry_delay_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.page.highlight_ms == 0 || self.page.save_feedback_ms == 0 {
            return Err(SaverError::Config(
                "page highlight durations must be greater than 0".to_string(),
            )
            .into());
        }

        if self.control.toast_ms == 0 {
            return Err(
                SaverError::Config("control.toast_ms must be greater than 0".to_string()).into(),
            );
        }

        self.desktop.opener_command()?;
        self.desktop.clipboard_command()?;

        Ok(())
    }
}
