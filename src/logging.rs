//! Logging setup
//!
//! Everything goes through `tracing`. Warnings and errors are printed to
//! stderr; with `--debug` the full debug stream is also written to a
//! daily-rolling file under `.zapconsole/logs/`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "zapconsole.log";

/// `./.zapconsole/logs`
pub fn default_log_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".zapconsole")
        .join("logs")
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    debug_mode: bool,
    log_dir: PathBuf,
    level: String,
    file: Option<PathBuf>,
    stderr_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            log_dir: default_log_dir(),
            level: "info".to_string(),
            file: None,
            stderr_level: LevelFilter::WARN,
        }
    }

    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        if debug {
            self.stderr_level = LevelFilter::DEBUG;
        }
        self
    }

    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Also write to this file (appending, no rotation).
    pub fn with_file(mut self, file: Option<PathBuf>) -> Self {
        self.file = file;
        self
    }

    /// Most verbose level shown on stderr.
    pub fn with_stderr_level(mut self, level: LevelFilter) -> Self {
        if !self.debug_mode {
            self.stderr_level = level;
        }
        self
    }

    /// `RUST_LOG` wins; otherwise `debug` in debug mode, else the configured level.
    fn env_filter(&self) -> EnvFilter {
        let level = if self.debug_mode { "debug" } else { self.level.as_str() };
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(config.stderr_level);

    let appender = if let Some(file) = &config.file {
        let dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = file
            .file_name()
            .context("Log file path has no file name")?;
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
        Some(tracing_appender::rolling::never(dir, name))
    } else if config.debug_mode {
        fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;
        Some(tracing_appender::rolling::daily(&config.log_dir, LOG_FILE_PREFIX))
    } else {
        None
    };

    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_thread_ids(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    if config.debug_mode {
        tracing::debug!("Debug logging to {}", config.log_dir.display());
    }

    Ok(guard)
}

fn log_files(dir: &Path) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if is_log && path.is_file() {
            let modified = entry.metadata()?.modified()?;
            files.push((path, modified));
        }
    }
    Ok(files)
}

/// Delete log files under `dir` not modified in the last `days` days.
pub fn cleanup_logs_in(dir: &Path, days: u64) -> std::io::Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(days * 24 * 60 * 60))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut removed = 0;
    for (path, modified) in log_files(dir)? {
        if modified <= cutoff {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// [`cleanup_logs_in`] for the default log directory.
pub fn cleanup_old_logs(days: u64) -> std::io::Result<usize> {
    cleanup_logs_in(&default_log_dir(), days)
}

/// Most recently written log file in `dir`.
pub fn latest_log_in(dir: &Path) -> Option<PathBuf> {
    log_files(dir)
        .ok()?
        .into_iter()
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path)
}

pub fn get_log_path() -> Option<PathBuf> {
    latest_log_in(&default_log_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder() {
        let config = LogConfig::new()
            .with_debug_mode(true)
            .with_stderr_level(LevelFilter::ERROR);
        assert!(config.debug_mode);
        assert_eq!(config.stderr_level, LevelFilter::DEBUG);

        let config = LogConfig::new().with_stderr_level(LevelFilter::INFO);
        assert_eq!(config.stderr_level, LevelFilter::INFO);
    }

    #[test]
    fn test_cleanup_only_touches_log_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zapconsole.log.2026-01-01"), "old").unwrap();
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(cleanup_logs_in(dir.path(), 7).unwrap(), 0);
        assert_eq!(cleanup_logs_in(dir.path(), 0).unwrap(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_latest_log() {
        let dir = TempDir::new().unwrap();
        assert!(latest_log_in(dir.path()).is_none());
        fs::write(dir.path().join("zapconsole.log.2026-03-02"), "x").unwrap();
        assert_eq!(
            latest_log_in(dir.path()).unwrap(),
            dir.path().join("zapconsole.log.2026-03-02")
        );
    }

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(cleanup_logs_in(&dir.path().join("absent"), 1).unwrap(), 0);
    }
}
