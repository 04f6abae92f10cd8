//! Local artifact persistence
//!
//! Artifacts are written to the configured output directory before any
//! remote step, so a failed publish can be retried from disk without
//! crawling again.

use crate::output::{Artifact, ArtifactSet};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Writes artifacts into one output directory
#[derive(Debug, Clone)]
pub struct LocalArtifactWriter {
    directory: PathBuf,
}

impl LocalArtifactWriter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes one artifact, creating the directory if needed
    ///
    /// # Returns
    ///
    /// The path the artifact was written to
    pub async fn write(&self, artifact: &Artifact) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(&artifact.name);
        fs::write(&path, &artifact.bytes).await?;
        info!(
            "Wrote {} artifact {} ({} bytes, sha256 {})",
            artifact.kind,
            path.display(),
            artifact.bytes.len(),
            artifact.fingerprint
        );
        Ok(path)
    }

    /// Writes both artifacts of a run
    pub async fn write_all(&self, artifacts: &ArtifactSet) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for artifact in artifacts.iter() {
            paths.push(self.write(artifact).await?);
        }
        Ok(paths)
    }

    /// Reads a previously written artifact back from disk
    pub async fn read(path: &Path) -> io::Result<Artifact> {
        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", path.display()),
                )
            })?;
        Ok(Artifact::from_existing(name, bytes))
    }
}
