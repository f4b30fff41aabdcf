//! Configuration for the `taskzenith` client.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskzenith/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error. An explicit `--config` path that
//! doesn't exist is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use taskzenith_proto::task::TaskStatus;

use crate::board::SyncConfig;
use crate::board::sync::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_EVENT_BUFFER};
use crate::store::http::DEFAULT_REQUEST_TIMEOUT;

/// Server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:9100";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    store: StoreFileConfig,
    board: BoardFileConfig,
    ui: UiFileConfig,
}

/// `[store]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    server_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[board]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    default_project: Option<String>,
    channel_capacity: Option<usize>,
    event_buffer: Option<usize>,
}

/// `[ui]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    show_descriptions: Option<bool>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of `taskzenith-server`.
    pub server_url: String,
    /// Per-request timeout for store calls.
    pub request_timeout: Duration,
    /// Use the built-in demo store instead of the server.
    pub offline: bool,
    /// Project used when a command names none.
    pub default_project: Option<String>,
    /// Synchronizer channel sizing.
    pub sync: SyncConfig,
    /// Print task descriptions under their titles.
    pub show_descriptions: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            offline: false,
            default_project: None,
            sync: SyncConfig {
                channel_capacity: DEFAULT_CHANNEL_CAPACITY,
                event_buffer: DEFAULT_EVENT_BUFFER,
            },
            show_descriptions: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed, or if the default one exists but is malformed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            server_url: cli
                .server_url
                .clone()
                .or_else(|| file.store.server_url.clone())
                .unwrap_or(defaults.server_url),
            request_timeout: cli
                .request_timeout_secs
                .or(file.store.request_timeout_secs)
                .map_or(defaults.request_timeout, Duration::from_secs),
            offline: cli.offline,
            default_project: file.board.default_project.clone(),
            sync: SyncConfig {
                channel_capacity: file
                    .board
                    .channel_capacity
                    .unwrap_or(defaults.sync.channel_capacity),
                event_buffer: file
                    .board
                    .event_buffer
                    .unwrap_or(defaults.sync.event_buffer),
            },
            show_descriptions: cli.descriptions
                || file
                    .ui
                    .show_descriptions
                    .unwrap_or(defaults.show_descriptions),
        }
    }

    /// Picks the project for a command: the explicit one, else the configured default.
    #[must_use]
    pub fn project<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit.or(self.default_project.as_deref())
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Kanban board client for TaskZenith")]
pub struct CliArgs {
    /// Base URL of the task server.
    #[arg(long, env = "TASKZENITH_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub request_timeout_secs: Option<u64>,

    /// Work against a built-in demo project instead of a server.
    #[arg(long, global = true)]
    pub offline: bool,

    /// Print task descriptions.
    #[arg(long, global = true)]
    pub descriptions: bool,

    /// Path to config file (default: `~/.config/taskzenith/config.toml`).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKZENITH_LOG", global = true)]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskzenith.log`).
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// What to do; prints the board when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Client subcommands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load a project and print its board.
    Board {
        /// Project id.
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Move a task to another column and report whether the change stuck.
    Move {
        /// Project id.
        #[arg(short, long)]
        project: Option<String>,
        /// Task id.
        #[arg(short, long)]
        task: String,
        /// Target column: backlog, todo, in-progress or done.
        #[arg(long)]
        to: TaskStatus,
    },
    /// Print one task in detail.
    Show {
        /// Project id.
        #[arg(short, long)]
        project: Option<String>,
        /// Task id.
        #[arg(short, long)]
        task: String,
    },
}

impl Default for Command {
    fn default() -> Self {
        Self::Board { project: None }
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("taskzenith").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
