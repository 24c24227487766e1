//! Command-line arguments and configuration file handling

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{ConfigError, ConfigResult, FileConfig, LogSettings, Settings};

#[cfg(test)]
mod tests;
