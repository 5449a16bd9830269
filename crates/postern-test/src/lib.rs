//! Test harnesses for postern.
//!
//! Provides `TestManifest` for building route tables from inline YAML
//! and the CLI regression suite.

#[cfg(test)]
pub mod cli;
pub mod manifest;

pub use manifest::{TestError, TestManifest};
