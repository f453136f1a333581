//! Logging configuration
//!
//! The subscriber itself is installed by the binary; this is the persisted
//! part that decides level, sinks and retention.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Logging settings persisted alongside the rest of the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// Default level filter (`trace`, `debug`, `info`, `warn`, `error`)
    #[serde(default = "default_level")]
    pub level: String,
    /// Log to stderr
    #[serde(default = "default_true")]
    pub console_output: bool,
    /// Log to a daily file in `log_directory`
    #[serde(default)]
    pub file_output: bool,
    /// Directory for log files
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    /// How many log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_directory() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("Buzzlight").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn default_max_log_files() -> usize {
    5
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            console_output: true,
            file_output: false,
            log_directory: default_log_directory(),
            max_log_files: default_max_log_files(),
        }
    }
}

impl LogConfig {
    /// Parse the configured level, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        LevelFilter::from_str(self.level.trim()).unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory if file output is enabled
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        if self.file_output {
            fs::create_dir_all(&self.log_directory)?;
        }
        Ok(())
    }

    /// Path of today's log file
    pub fn current_log_path(&self) -> PathBuf {
        let date = chrono::Local::now().format("%Y-%m-%d");
        self.log_directory.join(format!("buzzlight_{}.log", date))
    }

    /// Delete the oldest `.log` files beyond `max_log_files`
    ///
    /// Returns how many files were removed.
    pub fn cleanup_old_logs(&self) -> std::io::Result<usize> {
        if !self.log_directory.exists() {
            return Ok(0);
        }

        let mut logs: Vec<(std::time::SystemTime, PathBuf)> = fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "log"))
            .filter_map(|path| {
                let modified = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .collect();

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Newest first
        logs.sort_by(|a, b| b.0.cmp(&a.0));
        let mut removed = 0;
        for (_, path) in logs.into_iter().skip(self.max_log_files) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let mut config = LogConfig::default();
        assert_eq!(config.parse_level(), LevelFilter::INFO);

        config.level = "debug".to_string();
        assert_eq!(config.parse_level(), LevelFilter::DEBUG);

        config.level = "loud".to_string();
        assert_eq!(config.parse_level(), LevelFilter::INFO);
    }

    #[test]
    fn test_cleanup_old_logs_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            file_output: true,
            log_directory: dir.path().to_path_buf(),
            max_log_files: 2,
            ..LogConfig::default()
        };

        for i in 0..4 {
            fs::write(dir.path().join(format!("buzzlight_{}.log", i)), "x").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        assert_eq!(config.cleanup_old_logs().unwrap(), 2);
        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 3);
    }

    #[test]
    fn test_current_log_path_in_directory() {
        let config = LogConfig {
            log_directory: PathBuf::from("/tmp/buzzlight-logs"),
            ..LogConfig::default()
        };
        let path = config.current_log_path();
        assert!(path.starts_with("/tmp/buzzlight-logs"));
        assert_eq!(path.extension().unwrap(), "log");
    }
}
