//! TOML configuration file loading and settings resolution
//!
//! Precedence is command line, then configuration file, then built-in
//! defaults. The file is optional; when `--config-file` is not given the
//! default location under the user's config directory is tried.

use super::args::Args;
use crate::ingest::ListOptions;
use crate::queue::{ConsumerConfig, RequeuePolicy};
use crate::stats::DEFAULT_TICK_INTERVAL;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";
pub const DEFAULT_SIZE: i64 = 100;
pub const DEFAULT_CONCURRENCY: usize = 8;

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Configuration problems, all of them fixable by the operator
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("reading configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("no key format given (use --format or 'format' in the configuration file)")]
    MissingFormat,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Logger settings after merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
    pub file: Option<PathBuf>,
    /// `None` means colour when stderr is a terminal
    pub color: Option<bool>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub list: ListOptions,
    pub redis_url: String,
    pub dry_run: bool,
    pub consumer: ConsumerConfig,
    pub stats_interval: Duration,
    pub log: LogSettings,
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Caplist").join("caplist.toml"))
}

/// Contents of the TOML configuration file
///
/// Keys use the same names as the long command-line options. Unknown keys
/// are rejected so that typos do not go unnoticed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub format: Option<String>,
    pub size: Option<i64>,
    pub redis_url: Option<String>,
    pub concurrency: Option<usize>,
    pub max_attempts: Option<u16>,
    pub requeue_delay_ms: Option<u64>,
    pub stats_interval_secs: Option<u64>,
    pub dry_run: Option<bool>,
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl FromStr for FileConfig {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

/// Read the configuration file, if any
///
/// An explicitly named file must exist; the default file is optional.
pub async fn load_config_file(config_file: Option<&Path>) -> ConfigResult<Option<FileConfig>> {
    let path = match config_file {
        Some(path) if !path.exists() => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(None),
        },
    };

    log::debug!("Loading configuration from {}", path.display());
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

    contents
        .parse::<FileConfig>()
        .map(Some)
        .map_err(|source| ConfigError::Parse { path, source })
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

impl Args {
    /// Fill settings the command line left unset from the configuration file
    pub fn apply_file_config(&mut self, config: &FileConfig) {
        fn fill<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if target.is_none() {
                target.clone_from(value);
            }
        }

        fill(&mut self.format, &config.format);
        fill(&mut self.size, &config.size);
        fill(&mut self.redis_url, &config.redis_url);
        fill(&mut self.concurrency, &config.concurrency);
        fill(&mut self.max_attempts, &config.max_attempts);
        fill(&mut self.requeue_delay_ms, &config.requeue_delay_ms);
        fill(&mut self.stats_interval_secs, &config.stats_interval_secs);
        fill(&mut self.log_level, &config.log_level);
        fill(&mut self.log_format, &config.log_format);
        fill(&mut self.log_file, &config.log_file);

        self.dry_run |= config.dry_run.unwrap_or(false);
        if self.color_choice().is_none() {
            match config.color {
                Some(true) => self.color = true,
                Some(false) => self.no_color = true,
                None => {}
            }
        }
    }

    /// Apply defaults and validate
    pub fn resolve(&self) -> ConfigResult<Settings> {
        let format = self.format.clone().ok_or(ConfigError::MissingFormat)?;
        if format.trim().is_empty() {
            return Err(invalid("format", "must not be empty"));
        }

        let concurrency = self.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }

        let stats_secs = self
            .stats_interval_secs
            .unwrap_or(DEFAULT_TICK_INTERVAL.as_secs());
        if stats_secs == 0 {
            return Err(invalid("stats-interval-secs", "must be at least 1"));
        }

        let log_format = self.log_format.clone().unwrap_or_else(|| "text".to_string());
        if !matches!(log_format.as_str(), "text" | "ext" | "json") {
            return Err(invalid("log-format", "expected text, ext or json"));
        }

        let defaults = RequeuePolicy::default();
        let requeue = RequeuePolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            delay: self
                .requeue_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
            max_delay: defaults.max_delay,
        };

        let base_level = self.log_level.as_deref().unwrap_or("info");
        if !LOG_LEVELS.contains(&base_level) {
            return Err(invalid("log-level", "expected trace, debug, info, warn, error or off"));
        }

        Ok(Settings {
            list: ListOptions {
                format,
                size: self.size.unwrap_or(DEFAULT_SIZE),
            },
            redis_url: self
                .redis_url
                .clone()
                .unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            dry_run: self.dry_run,
            consumer: ConsumerConfig {
                concurrency,
                requeue,
            },
            stats_interval: Duration::from_secs(stats_secs),
            log: LogSettings {
                level: crate::core::logging::level_for_verbosity(base_level, self.verbosity())
                    .to_string(),
                format: log_format,
                file: self.effective_log_file().cloned(),
                color: self.color_choice(),
            },
        })
    }
}
