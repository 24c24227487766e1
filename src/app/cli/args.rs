//! Command-line arguments
//!
//! Every pipeline setting is optional here so that values from the
//! configuration file can fill the gaps; defaults are applied last when the
//! arguments are resolved into [`Settings`](super::config::Settings).

use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "caplist")]
#[command(about = "Push JSON messages onto capped Redis lists keyed by their content")]
#[command(version, long_version = crate::core::version::long_version())]
#[command(
    after_help = "Messages are read from stdin, one JSON document per line.\nExample: caplist --format 'events:{{user_id}}' --size 100 < events.ndjson"
)]
pub struct Args {
    /// Key format with {{field}} placeholders
    #[arg(short = 'k', long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Maximum number of entries kept per list
    #[arg(short = 's', long = "size", value_name = "COUNT", allow_negative_numbers = true)]
    pub size: Option<i64>,

    /// Redis connection URL
    #[arg(short = 'u', long = "redis-url", value_name = "URL")]
    pub redis_url: Option<String>,

    /// Messages handled at the same time
    #[arg(short = 'j', long = "concurrency", value_name = "COUNT")]
    pub concurrency: Option<usize>,

    /// Deliveries before a failing message is given up (0 = unlimited)
    #[arg(long = "max-attempts", value_name = "COUNT")]
    pub max_attempts: Option<u16>,

    /// Base delay before a failed message is redelivered
    #[arg(long = "requeue-delay-ms", value_name = "MILLIS")]
    pub requeue_delay_ms: Option<u64>,

    /// Seconds between stats reports
    #[arg(long = "stats-interval-secs", value_name = "SECONDS")]
    pub stats_interval_secs: Option<u64>,

    /// Write to an in-memory store instead of Redis
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force coloured log output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured log output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Less log output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,
}

impl Args {
    /// Parse from an explicit argument list (first item is the program name)
    pub fn parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// Net `-v`/`-q` count
    pub fn verbosity(&self) -> i8 {
        (self.verbose.min(10) as i8) - (self.quiet.min(10) as i8)
    }

    /// Colour choice from flags; `None` means decide from the terminal
    pub fn color_choice(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Log file with the `none` / `-` magic values removed
    pub fn effective_log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref().filter(|path| {
            let s = path.to_string_lossy();
            !(s.eq_ignore_ascii_case("none") || s == "-")
        })
    }
}
