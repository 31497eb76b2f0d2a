//! Command-line, environment and file settings.
//!
//! Precedence, highest first: flag or environment variable, `--config`
//! TOML file, built-in default.

use clap::Parser;
use minechat_client::{ClientConfig, Timeouts};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "minechat.dvmn.org";
pub const DEFAULT_READ_PORT: u16 = 5000;
pub const DEFAULT_WRITE_PORT: u16 = 5050;
pub const DEFAULT_HISTORY: &str = "chat.log";
pub const DEFAULT_CREDENTIALS: &str = "credentials.json";

#[derive(Debug, Parser)]
#[command(name = "minechat", version, about = "Chat client that reconnects on its own")]
pub struct ChatArgs {
    /// TOML file with defaults for any of the options below.
    #[arg(long, env = "CHAT_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "CHAT_HOST")]
    pub host: Option<String>,

    #[arg(long, env = "PORT_READ")]
    pub read_port: Option<u16>,

    #[arg(long, env = "PORT_WRITE")]
    pub write_port: Option<u16>,

    /// Account token. Falls back to the credentials file.
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// History file, appended to and replayed at startup.
    #[arg(long, env = "CHAT_HISTORY")]
    pub history: Option<PathBuf>,

    #[arg(long, env = "CHAT_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Seconds a single read may take before the read stream is dead.
    #[arg(long, value_name = "SECS")]
    pub read_timeout: Option<f64>,

    /// Seconds without any liveness signal before reconnecting.
    #[arg(long, value_name = "SECS")]
    pub watchdog_timeout: Option<f64>,

    /// Seconds between keep-alive pulses.
    #[arg(long, value_name = "SECS")]
    pub keep_alive: Option<f64>,

    /// Seconds to wait before reconnecting.
    #[arg(long, value_name = "SECS")]
    pub backoff: Option<f64>,
}

#[derive(Debug, Parser)]
#[command(name = "minechat-register", version, about = "Register a minechat account")]
pub struct RegisterArgs {
    #[arg(long, env = "CHAT_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "PORT_WRITE", default_value_t = DEFAULT_WRITE_PORT)]
    pub port: u16,

    /// Desired nickname.
    #[arg(long)]
    pub nickname: String,

    /// Where to save the issued nickname and token.
    #[arg(long, env = "CHAT_CREDENTIALS", default_value = DEFAULT_CREDENTIALS)]
    pub credentials: PathBuf,
}

/// Contents of the `--config` file. Keys mirror the long flags.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSettings {
    pub host: Option<String>,
    pub read_port: Option<u16>,
    pub write_port: Option<u16>,
    pub token: Option<String>,
    pub history: Option<PathBuf>,
    pub credentials: Option<PathBuf>,
    pub read_timeout: Option<f64>,
    pub watchdog_timeout: Option<f64>,
    pub keep_alive: Option<f64>,
    pub backoff: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{name} must be a finite, non-negative number of seconds, got {value}")]
    Duration { name: &'static str, value: f64 },
}

/// Fully resolved settings for the chat binary.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub host: String,
    pub read_port: u16,
    pub write_port: u16,
    pub token: Option<String>,
    pub history: PathBuf,
    pub credentials: PathBuf,
    pub timeouts: Timeouts,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl ChatSettings {
    /// Read the config file named by `args`, if any, and merge.
    pub fn resolve(args: ChatArgs) -> Result<Self, SettingsError> {
        let file = match &args.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };
        Self::merge(args, file)
    }

    pub fn merge(args: ChatArgs, file: FileSettings) -> Result<Self, SettingsError> {
        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            read: seconds("read timeout", args.read_timeout.or(file.read_timeout))?
                .unwrap_or(defaults.read),
            watchdog: seconds("watchdog timeout", args.watchdog_timeout.or(file.watchdog_timeout))?
                .unwrap_or(defaults.watchdog),
            keep_alive: seconds("keep-alive", args.keep_alive.or(file.keep_alive))?
                .unwrap_or(defaults.keep_alive),
            backoff: seconds("backoff", args.backoff.or(file.backoff))?
                .unwrap_or(defaults.backoff),
        };

        Ok(Self {
            host: args
                .host
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            read_port: args.read_port.or(file.read_port).unwrap_or(DEFAULT_READ_PORT),
            write_port: args.write_port.or(file.write_port).unwrap_or(DEFAULT_WRITE_PORT),
            token: args.token.or(file.token).filter(|t| !t.trim().is_empty()),
            history: args
                .history
                .or(file.history)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HISTORY)),
            credentials: args
                .credentials
                .or(file.credentials)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS)),
            timeouts,
        })
    }

    pub fn client_config(&self, token: String) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            read_port: self.read_port,
            write_port: self.write_port,
            token,
            timeouts: self.timeouts,
        }
    }
}

fn seconds(name: &'static str, value: Option<f64>) -> Result<Option<Duration>, SettingsError> {
    value
        .map(|v| Duration::try_from_secs_f64(v).map_err(|_| SettingsError::Duration { name, value: v }))
        .transpose()
}
