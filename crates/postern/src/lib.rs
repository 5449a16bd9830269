//! Library side of the `postern` CLI: route manifest loading.

pub mod manifest;

pub use manifest::{ManifestError, RoutesManifest};
