//! Application module

pub mod cli;
pub mod startup;

pub use startup::{load_settings, run, startup, RunSummary, StartupError};

#[cfg(test)]
mod tests;
