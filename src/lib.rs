//! Capped list ingestion
//!
//! Consumes JSON messages, derives a Redis list key from each message with a
//! `{{field}}` template, and pushes the raw payload onto that list while
//! trimming it to a fixed size.

pub mod app;
pub mod core;
pub mod ingest;
pub mod queue;
pub mod stats;
pub mod store;
pub mod template;
