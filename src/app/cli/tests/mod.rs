//! Tests for argument parsing and configuration merging
