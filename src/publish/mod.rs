//! Versioned-archive publishing
//!
//! A publish runs four steps in a fixed order:
//! 1. both artifacts are written to the local output directory
//! 2. the target location is listed for files of the same API version
//! 3. every listed file is moved to the archive location
//! 4. the new narrative artifact is uploaded to the target location
//!
//! Step 4 never starts unless step 3 finished for every file, so the
//! previous generation stays in place whenever archiving fails. Archived
//! files are not moved back after a failed upload.

use crate::config::Config;
use crate::output::{version_prefix, Artifact, ArtifactSet};
use crate::retry::RetryPolicy;
use crate::storage::{FsObjectStore, LocalArtifactWriter, ObjectRef, ObjectStore, StorageError};
use crate::ConfigError;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Errors fatal to a publish
///
/// Local artifacts stay on disk in every case, so the publish can be
/// repeated without crawling again.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to archive {name}: {message}")]
    ArchiveFailed { name: String, message: String },

    #[error("failed to upload {name}: {message}")]
    UploadFailed { name: String, message: String },

    #[error("failed to list publish target: {0}")]
    ListFailed(String),

    #[error("failed to write artifacts locally: {0}")]
    LocalWrite(#[from] io::Error),
}

/// What a successful publish did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// Artifacts written to the local output directory
    pub local_paths: Vec<PathBuf>,

    /// Previous-generation files, at their archive location
    pub archived: Vec<ObjectRef>,

    /// Identifier reported by the store for the uploaded artifact
    pub object_id: String,

    /// Name of the uploaded artifact
    pub name: String,

    /// SHA-256 of the uploaded bytes
    pub fingerprint: String,
}

/// Runs the archive-then-upload protocol against one object store
pub struct PublishManager {
    store: Arc<dyn ObjectStore>,
    writer: LocalArtifactWriter,
    target: String,
    archive: String,
    artifact_prefix: String,
    retry: RetryPolicy,
}

impl PublishManager {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        writer: LocalArtifactWriter,
        target: impl Into<String>,
        archive: impl Into<String>,
        artifact_prefix: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            writer,
            target: target.into(),
            archive: archive.into(),
            artifact_prefix: artifact_prefix.into(),
            retry,
        }
    }

    /// Builds a manager publishing to the configured store root
    ///
    /// Remote steps reuse the crawler's retry policy.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let root = config.publish.store_root.as_deref().ok_or_else(|| {
            ConfigError::Validation("publish.store_root is required to publish".to_string())
        })?;

        Ok(Self::new(
            Arc::new(FsObjectStore::new(root)),
            LocalArtifactWriter::new(&config.output.directory),
            &config.publish.target,
            &config.publish.archive,
            &config.output.artifact_prefix,
            config.crawler.retry.to_policy(),
        ))
    }

    pub fn writer(&self) -> &LocalArtifactWriter {
        &self.writer
    }

    /// Writes both artifacts locally without touching the remote store
    pub async fn persist_local(&self, artifacts: &ArtifactSet) -> Result<Vec<PathBuf>, PublishError> {
        Ok(self.writer.write_all(artifacts).await?)
    }

    /// Persists the artifacts locally, then publishes the narrative one
    ///
    /// # Arguments
    ///
    /// * `artifacts` - Both renderings of one document
    /// * `version` - API version the artifacts belong to; selects which
    ///   existing files get archived
    ///
    /// # Returns
    ///
    /// A `PublishResult` once the store confirmed the upload
    pub async fn publish(&self, artifacts: &ArtifactSet, version: &str) -> Result<PublishResult, PublishError> {
        let local_paths = self.persist_local(artifacts).await?;
        self.publish_remote(&artifacts.narrative, version, local_paths).await
    }

    /// Publishes a narrative artifact already on disk, without crawling
    pub async fn publish_existing(&self, path: &Path, version: &str) -> Result<PublishResult, PublishError> {
        let artifact = LocalArtifactWriter::read(path).await?;
        info!("Publishing existing artifact {}", path.display());
        self.publish_remote(&artifact, version, vec![path.to_path_buf()]).await
    }

    async fn publish_remote(
        &self,
        artifact: &Artifact,
        version: &str,
        local_paths: Vec<PathBuf>,
    ) -> Result<PublishResult, PublishError> {
        let archived = self.archive_previous(version).await?;

        let store = &self.store;
        let target = self.target.as_str();
        let object_id = self
            .retry
            .run(
                &format!("upload {}", artifact.name),
                move || store.upload(&artifact.bytes, &artifact.name, target),
                StorageError::is_transient,
            )
            .await
            .map_err(|e| {
                error!("Upload of {} failed: {}", artifact.name, e);
                PublishError::UploadFailed {
                    name: artifact.name.clone(),
                    message: e.to_string(),
                }
            })?;

        info!(
            "Published {} as {} ({} previous files archived)",
            artifact.name,
            object_id,
            archived.len()
        );

        Ok(PublishResult {
            local_paths,
            archived,
            object_id,
            name: artifact.name.clone(),
            fingerprint: artifact.fingerprint.clone(),
        })
    }

    /// Moves every file of `version` out of the target location
    async fn archive_previous(&self, version: &str) -> Result<Vec<ObjectRef>, PublishError> {
        let store = &self.store;
        let target = self.target.as_str();
        let archive = self.archive.as_str();
        let pattern = version_prefix(&self.artifact_prefix, version);
        let pattern = pattern.as_str();

        let existing = self
            .retry
            .run(
                &format!("list {}", target),
                move || store.list(target, pattern),
                StorageError::is_transient,
            )
            .await
            .map_err(|e| {
                error!("Listing {} failed: {}", target, e);
                PublishError::ListFailed(e.to_string())
            })?;

        let mut archived = Vec::with_capacity(existing.len());
        for object in &existing {
            let moved = self
                .retry
                .run(
                    &format!("archive {}", object),
                    move || store.move_object(object, archive),
                    StorageError::is_transient,
                )
                .await
                .map_err(|e| {
                    error!("Archiving {} failed: {}", object, e);
                    PublishError::ArchiveFailed {
                        name: object.name.clone(),
                        message: e.to_string(),
                    }
                })?;
            info!("Archived {} to {}", object, moved);
            archived.push(moved);
        }
        Ok(archived)
    }
}
