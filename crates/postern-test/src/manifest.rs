//! Inline route manifests written to a temporary directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

use postern_lib::{ManifestError, RoutesManifest};
use postern_router::RouteTable;

/// Errors from the manifest harness.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("failed to write manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// A route manifest on disk, removed when dropped.
pub struct TestManifest {
    _dir: TempDir,
    path: PathBuf,
}

impl TestManifest {
    /// Write `yaml` to `routes.yaml` in a fresh temporary directory.
    pub fn new(yaml: &str) -> Result<Self, TestError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("routes.yaml");
        std::fs::write(&path, yaml)?;
        Ok(Self { _dir: dir, path })
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest and build its route table.
    pub fn table(&self) -> Result<RouteTable, TestError> {
        let manifest = RoutesManifest::load(&self.path)?;
        Ok(manifest.build()?)
    }
}
