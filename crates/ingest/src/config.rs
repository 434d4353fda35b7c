//! File processor configuration.
//!
//! Loaded from the `FileProcessor` section of a JSON settings file (path from
//! `WMS_SETTINGS`, else `appsettings.json` if present), then overridden by
//! `WMS_*` environment variables. Missing values use the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Settings file consulted when `WMS_SETTINGS` is unset.
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileProcessorConfig {
    /// Directory observed for dropped files (non-recursive).
    pub watch_path: PathBuf,
    pub processed_path: PathBuf,
    /// Validation failures go to `ValidationErrors` beneath this directory.
    pub error_path: PathBuf,
    /// Directory holding `<Kind>.schema.json` overrides.
    pub schema_path: Option<PathBuf>,
    /// Glob matched against file names.
    pub file_filter: String,
    pub poll_interval_ms: u64,
    pub max_concurrent: usize,
    pub schema_validation: bool,
    /// Also process files already present when the watcher starts.
    pub process_existing: bool,
}

impl Default for FileProcessorConfig {
    fn default() -> Self {
        Self {
            watch_path: PathBuf::from("data/incoming"),
            processed_path: PathBuf::from("data/processed"),
            error_path: PathBuf::from("data/errors"),
            schema_path: None,
            file_filter: "*.xml".to_string(),
            poll_interval_ms: 1000,
            max_concurrent: 4,
            schema_validation: true,
            process_existing: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SettingsFile {
    #[serde(default)]
    file_processor: FileProcessorConfig,
}

impl FileProcessorConfig {
    /// Settings file (if any), then environment overrides, then validation.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = std::env::var("WMS_SETTINGS")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let mut config = match settings {
            Some(path) => Self::from_file(&path)?,
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read the `FileProcessor` section of a JSON settings file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: SettingsFile = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings.file_processor)
    }

    /// Apply `WMS_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("WMS_WATCH_PATH") {
            self.watch_path = PathBuf::from(v);
        }
        if let Some(v) = get("WMS_PROCESSED_PATH") {
            self.processed_path = PathBuf::from(v);
        }
        if let Some(v) = get("WMS_ERROR_PATH") {
            self.error_path = PathBuf::from(v);
        }
        if let Some(v) = get("WMS_SCHEMA_PATH") {
            self.schema_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("WMS_FILE_FILTER") {
            self.file_filter = v;
        }
        if let Some(v) = get("WMS_POLL_INTERVAL_MS") {
            self.poll_interval_ms = v
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("WMS_POLL_INTERVAL_MS", format!("{e}")))?;
        }
        if let Some(v) = get("WMS_MAX_CONCURRENT") {
            self.max_concurrent = v
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("WMS_MAX_CONCURRENT", format!("{e}")))?;
        }
        if let Some(v) = get("WMS_SCHEMA_VALIDATION") {
            self.schema_validation = parse_flag(&v)
                .ok_or_else(|| ConfigError::invalid("WMS_SCHEMA_VALIDATION", format!("not a boolean: {v}")))?;
        }
        if let Some(v) = get("WMS_PROCESS_EXISTING") {
            self.process_existing = parse_flag(&v)
                .ok_or_else(|| ConfigError::invalid("WMS_PROCESS_EXISTING", format!("not a boolean: {v}")))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, path) in [
            ("WatchPath", &self.watch_path),
            ("ProcessedPath", &self.processed_path),
            ("ErrorPath", &self.error_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::invalid(key, "must not be empty"));
            }
        }
        if self.watch_path == self.processed_path || self.watch_path == self.error_path {
            return Err(ConfigError::invalid(
                "WatchPath",
                "must differ from the processed and error directories",
            ));
        }
        if self.file_filter.trim().is_empty() {
            return Err(ConfigError::invalid("FileFilter", "must not be empty"));
        }
        glob::Pattern::new(&self.file_filter)
            .map_err(|e| ConfigError::invalid("FileFilter", e.to_string()))?;
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("PollIntervalMs", "must be greater than zero"));
        }
        if self.max_concurrent == 0 {
            return Err(ConfigError::invalid("MaxConcurrent", "must be at least 1"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
