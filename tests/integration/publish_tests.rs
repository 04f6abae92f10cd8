//! Integration tests for publishing
//!
//! These tests run the archive-then-upload protocol against a directory
//! backed object store in a temporary directory.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use mambu_docs::model::Document;
use mambu_docs::output::render_artifacts;
use mambu_docs::publish::PublishError;
use mambu_docs::retry::RetryPolicy;
use mambu_docs::storage::{
    FsObjectStore, LocalArtifactWriter, ObjectRef, ObjectStore, StorageError, StorageResult,
};
use mambu_docs::PublishManager;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Wraps a store, records every call and optionally refuses moves
struct RecordingStore {
    inner: FsObjectStore,
    calls: Mutex<Vec<String>>,
    refuse_moves: bool,
}

impl RecordingStore {
    fn new(root: &std::path::Path, refuse_moves: bool) -> Self {
        Self {
            inner: FsObjectStore::new(root),
            calls: Mutex::new(Vec::new()),
            refuse_moves,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn list(&self, location: &str, name_prefix: &str) -> StorageResult<Vec<ObjectRef>> {
        self.calls.lock().unwrap().push("list".to_string());
        self.inner.list(location, name_prefix).await
    }

    async fn move_object(&self, object: &ObjectRef, new_location: &str) -> StorageResult<ObjectRef> {
        self.calls.lock().unwrap().push(format!("move {}", object.name));
        if self.refuse_moves {
            return Err(StorageError::Transient("drive busy".to_string()));
        }
        self.inner.move_object(object, new_location).await
    }

    async fn upload(&self, bytes: &[u8], name: &str, location: &str) -> StorageResult<String> {
        self.calls.lock().unwrap().push(format!("upload {}", name));
        self.inner.upload(bytes, name, location).await
    }
}

fn document(hour: u32) -> Document {
    Document {
        version: "v2".to_string(),
        pages: Vec::new(),
        generated_at: Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap(),
    }
}

fn manager(store: Arc<dyn ObjectStore>, output: &TempDir) -> PublishManager {
    PublishManager::new(
        store,
        LocalArtifactWriter::new(output.path()),
        "current",
        "archive",
        "mambu_api_",
        RetryPolicy::new(2, Duration::from_millis(1), 2.0),
    )
}

#[tokio::test]
async fn test_publish_archives_previous_generation() {
    let remote = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let store = Arc::new(FsObjectStore::new(remote.path()));
    let manager = manager(store, &output);

    let first = render_artifacts(&document(8), "mambu_api_").unwrap();
    let second = render_artifacts(&document(9), "mambu_api_").unwrap();

    let result = manager.publish(&first, "v2").await.unwrap();
    assert!(result.archived.is_empty());
    assert_eq!(result.object_id, format!("current/{}", first.narrative.name));

    let result = manager.publish(&second, "v2").await.unwrap();
    assert_eq!(result.archived, vec![ObjectRef::new("archive", first.narrative.name.clone())]);

    // The archived generation is byte-for-byte what was published before
    let archived = std::fs::read(remote.path().join("archive").join(&first.narrative.name)).unwrap();
    assert_eq!(archived, first.narrative.bytes);

    let current: Vec<String> = std::fs::read_dir(remote.path().join("current"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(current, vec![second.narrative.name.clone()]);

    // Both runs kept their local artifacts
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 4);
}

#[tokio::test]
async fn test_other_versions_are_left_alone() {
    let remote = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::create_dir_all(remote.path().join("current")).unwrap();
    std::fs::write(remote.path().join("current/mambu_api_v1_20240101_000000.md"), "v1").unwrap();

    let store = Arc::new(FsObjectStore::new(remote.path()));
    let artifacts = render_artifacts(&document(8), "mambu_api_").unwrap();
    let result = manager(store, &output).publish(&artifacts, "v2").await.unwrap();

    assert!(result.archived.is_empty());
    assert!(remote.path().join("current/mambu_api_v1_20240101_000000.md").exists());
}

#[tokio::test]
async fn test_moves_happen_before_upload() {
    let remote = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::create_dir_all(remote.path().join("current")).unwrap();
    std::fs::write(remote.path().join("current/mambu_api_v2_a.md"), "a").unwrap();
    std::fs::write(remote.path().join("current/mambu_api_v2_b.md"), "b").unwrap();

    let store = Arc::new(RecordingStore::new(remote.path(), false));
    let artifacts = render_artifacts(&document(8), "mambu_api_").unwrap();
    manager(store.clone(), &output).publish(&artifacts, "v2").await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            "list".to_string(),
            "move mambu_api_v2_a.md".to_string(),
            "move mambu_api_v2_b.md".to_string(),
            format!("upload {}", artifacts.narrative.name),
        ]
    );
}

#[tokio::test]
async fn test_failed_archive_keeps_current_content() {
    let remote = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::create_dir_all(remote.path().join("current")).unwrap();
    std::fs::write(remote.path().join("current/mambu_api_v2_old.md"), "old").unwrap();

    let store = Arc::new(RecordingStore::new(remote.path(), true));
    let artifacts = render_artifacts(&document(8), "mambu_api_").unwrap();
    let err = manager(store.clone(), &output)
        .publish(&artifacts, "v2")
        .await
        .unwrap_err();

    assert!(matches!(err, PublishError::ArchiveFailed { .. }));
    // Transient failures were retried, then the publish stopped
    assert_eq!(store.calls().iter().filter(|c| c.starts_with("move")).count(), 2);
    assert!(!store.calls().iter().any(|c| c.starts_with("upload")));

    assert_eq!(
        std::fs::read_to_string(remote.path().join("current/mambu_api_v2_old.md")).unwrap(),
        "old"
    );
    assert!(output.path().join(&artifacts.narrative.name).exists());
}

#[tokio::test]
async fn test_publish_only_uses_local_artifact() {
    let remote = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let saved = output.path().join("mambu_api_v2_20240601_070000.md");
    std::fs::write(&saved, "# Saved run").unwrap();

    let store = Arc::new(FsObjectStore::new(remote.path()));
    let result = manager(store, &output).publish_existing(&saved, "v2").await.unwrap();

    assert_eq!(result.name, "mambu_api_v2_20240601_070000.md");
    assert_eq!(
        std::fs::read_to_string(remote.path().join("current/mambu_api_v2_20240601_070000.md")).unwrap(),
        "# Saved run"
    );
}
