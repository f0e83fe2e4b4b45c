//! Command line and configuration.
//!
//! Settings are layered, later wins: built-in defaults, the JSON config file
//! (`kanban_config.json` or `--config`), environment variables, flags.
//! Clap folds the environment into the flags, so only the file layer is
//! merged by hand.

use crate::error::AppError;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "kanban_config.json";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_FILE: &str = "taskboard.log";

#[derive(Parser, Debug, Default)]
#[command(name = "taskboard")]
#[command(version, about = "Terminal kanban board backed by the board REST API")]
pub struct Cli {
    /// JSON config file (defaults to ./kanban_config.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the board API
    #[arg(long, env = "TASKBOARD_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Code of the project to open
    #[arg(short, long, env = "TASKBOARD_PROJECT", global = true)]
    pub project: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Where the interactive board writes its log
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Open the interactive board (default)
    Board,
    /// List all tasks per column
    List,
    /// List the tags used on the board
    Tags,
    /// List the users assigned on the board
    Users,
    /// Show task counts per column
    Stats,
}

/// Shape of `kanban_config.json`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub project: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// Reads `path`, or the default file if it exists. An explicit path
    /// that cannot be read is an error; a missing default file is not.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path).map_err(|source| AppError::ConfigFile {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| AppError::ConfigParse { path, source })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub project: String,
    pub timeout: Duration,
    pub log_file: PathBuf,
}

impl Config {
    pub fn resolve(cli: &Cli) -> Result<Self, AppError> {
        let file = FileConfig::load(cli.config.as_deref())?;
        Self::merge(cli, file)
    }

    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, AppError> {
        let project = cli
            .project
            .clone()
            .or(file.project)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "no project code given (use --project, TASKBOARD_PROJECT or the config file)"
                        .to_string(),
                )
            })?;
        let timeout_secs = cli
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(AppError::Config("timeout must be at least 1 second".to_string()));
        }
        Ok(Self {
            api_url: cli
                .api_url
                .clone()
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            project,
            timeout: Duration::from_secs(timeout_secs),
            log_file: cli
                .log_file
                .clone()
                .or(file.log_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
        })
    }
}
