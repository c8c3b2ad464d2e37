// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup for hosts embedding the client

use crate::config::LogConfig;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {message}")]
    Filter { filter: String, message: String },
    #[error("log path has no file name: {0}")]
    NoFileName(std::path::PathBuf),
    #[error("failed to create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured filter when set. With a log path the
/// output goes through a non-blocking file appender and the returned guard
/// must be held until shutdown; otherwise output goes to stderr.
pub fn init(config: &LogConfig) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = build_filter(&config.filter)?;

    let Some(path) = &config.path else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|_| LoggingError::AlreadyInstalled)?;
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::NoFileName(path.clone()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;
    Ok(Some(guard))
}

fn build_filter(configured: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(configured).map_err(|e| LoggingError::Filter {
        filter: configured.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
