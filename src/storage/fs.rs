//! Object store backed by a directory tree
//!
//! Each location is a directory below the root, for example a mounted
//! shared drive. Moves are renames, so archived files stay byte-for-byte
//! identical. Uploads are written to a temporary name first and renamed
//! into place, so a failed upload never leaves a partial file behind.

use crate::storage::traits::{ObjectRef, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Filesystem implementation of [`ObjectStore`]
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn location_dir(&self, location: &str) -> PathBuf {
        self.root.join(location)
    }

    /// First free name in `dir`, adding `_1`, `_2`, ... before the extension
    async fn free_name(dir: &Path, name: &str) -> StorageResult<String> {
        if !exists(&dir.join(name)).await? {
            return Ok(name.to_string());
        }
        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, format!(".{}", ext)),
            _ => (name, String::new()),
        };
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}{}", stem, n, extension);
            if !exists(&dir.join(&candidate)).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

async fn exists(path: &Path) -> StorageResult<bool> {
    match fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(classify_io(e, path)),
    }
}

fn classify_io(e: io::Error, path: &Path) -> StorageError {
    match e.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path.display().to_string()),
        io::ErrorKind::PermissionDenied => {
            StorageError::Permanent(format!("permission denied: {}", path.display()))
        }
        _ => StorageError::Io(e),
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn list(&self, location: &str, name_prefix: &str) -> StorageResult<Vec<ObjectRef>> {
        let dir = self.location_dir(location);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(classify_io(e, &dir)),
        };

        let mut objects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(name_prefix) {
                objects.push(ObjectRef::new(location, name));
            }
        }
        objects.sort();
        Ok(objects)
    }

    async fn move_object(&self, object: &ObjectRef, new_location: &str) -> StorageResult<ObjectRef> {
        let source = self.location_dir(&object.location).join(&object.name);
        let target_dir = self.location_dir(new_location);
        fs::create_dir_all(&target_dir)
            .await
            .map_err(|e| classify_io(e, &target_dir))?;

        let name = Self::free_name(&target_dir, &object.name).await?;
        let destination = target_dir.join(&name);
        fs::rename(&source, &destination)
            .await
            .map_err(|e| classify_io(e, &source))?;

        debug!("Moved {} to {}", source.display(), destination.display());
        Ok(ObjectRef::new(new_location, name))
    }

    async fn upload(&self, bytes: &[u8], name: &str, location: &str) -> StorageResult<String> {
        let dir = self.location_dir(location);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| classify_io(e, &dir))?;

        let temporary = dir.join(format!(".{}.partial", name));
        let destination = dir.join(name);
        fs::write(&temporary, bytes)
            .await
            .map_err(|e| classify_io(e, &temporary))?;
        if let Err(e) = fs::rename(&temporary, &destination).await {
            let _ = fs::remove_file(&temporary).await;
            return Err(classify_io(e, &destination));
        }

        debug!("Uploaded {} bytes to {}", bytes.len(), destination.display());
        Ok(ObjectRef::new(location, name).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("current/nested")).unwrap();
        std::fs::write(dir.path().join("current/mambu_api_v2_1.md"), "a").unwrap();
        std::fs::write(dir.path().join("current/mambu_api_v1_1.md"), "b").unwrap();
        std::fs::write(dir.path().join("current/mambu_api_v2_0.json"), "c").unwrap();

        let listed = store.list("current", "mambu_api_v2_").await.unwrap();
        let names: Vec<&str> = listed.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["mambu_api_v2_0.json", "mambu_api_v2_1.md"]);
    }

    #[tokio::test]
    async fn test_list_missing_location_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        assert!(store.list("nowhere", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_keeps_bytes() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        store.upload(b"old content", "doc.md", "current").await.unwrap();

        let moved = store
            .move_object(&ObjectRef::new("current", "doc.md"), "archive")
            .await
            .unwrap();
        assert_eq!(moved, ObjectRef::new("archive", "doc.md"));
        assert_eq!(
            std::fs::read(dir.path().join("archive/doc.md")).unwrap(),
            b"old content"
        );
        assert!(!dir.path().join("current/doc.md").exists());
    }

    #[tokio::test]
    async fn test_move_never_overwrites_archive() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        store.upload(b"first", "doc.md", "archive").await.unwrap();
        store.upload(b"second", "doc.md", "current").await.unwrap();

        let moved = store
            .move_object(&ObjectRef::new("current", "doc.md"), "archive")
            .await
            .unwrap();
        assert_eq!(moved.name, "doc_1.md");
        assert_eq!(std::fs::read(dir.path().join("archive/doc.md")).unwrap(), b"first");
        assert_eq!(std::fs::read(dir.path().join("archive/doc_1.md")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_move_missing_object() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        let err = store
            .move_object(&ObjectRef::new("current", "ghost.md"), "archive")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upload_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());
        let id = store.upload(b"# Docs", "doc.md", "current").await.unwrap();
        assert_eq!(id, "current/doc.md");

        let names: Vec<String> = std::fs::read_dir(dir.path().join("current"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["doc.md".to_string()]);
    }
}
