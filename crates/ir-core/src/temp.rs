//! Scoped temporary artifacts.

use ir_common::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// A temporary file removed when the guard drops.
///
/// Deletion retries once after a short delay so a scanner or indexer
/// holding the file briefly does not leak the artifact. A second
/// failure is logged and swallowed; drop never panics.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    /// Create an empty temp file with the given name affixes.
    pub fn create(prefix: &str, suffix: &str) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile()?;
        // Detach from tempfile's own deletion; this guard owns cleanup.
        let (_, path) = file.keep().map_err(|err| err.error)?;
        Ok(TempArtifact { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(first) = std::fs::remove_file(&self.path) {
            if first.kind() == std::io::ErrorKind::NotFound {
                return;
            }
            warn!(path = %self.path.display(), %first, "temp cleanup failed, retrying");
            std::thread::sleep(Duration::from_millis(100));
            if let Err(second) = std::fs::remove_file(&self.path) {
                if second.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), %second, "temp artifact left behind");
                }
            }
        }
    }
}
