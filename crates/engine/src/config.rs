// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration: TOML file plus `OBC_*` environment overrides

use crate::env;
use crate::transport::BLUETOOTH;
use obc_adapters::Direction;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors from loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Which direction the next queued transfer starts in once the head finishes
/// and no notifier is installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueAdvance {
    /// Always start the next transfer as a put
    #[default]
    Legacy,
    /// Start the next transfer in its own direction
    ByDirection,
}

impl QueueAdvance {
    /// Direction to start `next` in, given its own direction.
    pub fn direction(self, own: Direction) -> Direction {
        match self {
            QueueAdvance::Legacy => Direction::Put,
            QueueAdvance::ByDirection => own,
        }
    }
}

impl FromStr for QueueAdvance {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "legacy" => Ok(QueueAdvance::Legacy),
            "by_direction" => Ok(QueueAdvance::ByDirection),
            other => Err(ConfigError::InvalidEnv {
                var: "OBC_QUEUE_ADVANCE",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive
    pub filter: String,
    /// Log file; stderr when absent
    pub path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Transport new sessions connect through
    pub transport: String,
    /// Object path prefix for exported sessions
    pub session_base_path: String,
    pub queue_advance: QueueAdvance,
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            transport: BLUETOOTH.to_string(),
            session_base_path: "/org/openobex".to_string(),
            queue_advance: QueueAdvance::default(),
            log: LogConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults with the environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `OBC_TRANSPORT`, `OBC_QUEUE_ADVANCE`, `OBC_LOG` and `OBC_LOG_PATH`.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(transport) = env::transport() {
            self.transport = transport;
        }
        if let Some(advance) = env::queue_advance() {
            self.queue_advance = advance.parse()?;
        }
        if let Some(filter) = env::log_filter() {
            self.log.filter = filter;
        }
        if let Some(path) = env::log_path() {
            self.log.path = Some(path);
        }
        Ok(self)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
