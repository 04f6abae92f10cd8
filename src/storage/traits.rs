//! Storage traits and error types
//!
//! This module defines the remote object store seam used by publishing and
//! the errors its implementations report.

use async_trait::async_trait;
use std::fmt;
use std::io;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Worth another attempt (timeouts, throttling, interrupted transfers)
    #[error("Transient storage failure: {0}")]
    Transient(String),

    #[error("Storage operation failed: {0}")]
    Permanent(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Returns true if retrying the operation may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            Self::NotFound(_) | Self::Permanent(_) => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A named object inside a store location
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    pub location: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.location, self.name)
    }
}

/// Remote storage holding published artifacts
///
/// Authentication belongs to the implementation. Locations are opaque
/// folder-like names such as `current` and `archive`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists objects in `location` whose names start with `name_prefix`, sorted by name
    async fn list(&self, location: &str, name_prefix: &str) -> StorageResult<Vec<ObjectRef>>;

    /// Moves an object, unmodified, into `new_location`
    ///
    /// # Returns
    ///
    /// Where the object ended up
    async fn move_object(&self, object: &ObjectRef, new_location: &str) -> StorageResult<ObjectRef>;

    /// Stores `bytes` as `name` in `location`
    ///
    /// # Returns
    ///
    /// The identifier of the stored object
    async fn upload(&self, bytes: &[u8], name: &str, location: &str) -> StorageResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StorageError::Transient("throttled".to_string()).is_transient());
        assert!(StorageError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).is_transient());
        assert!(!StorageError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "no")).is_transient());
        assert!(!StorageError::NotFound("x".to_string()).is_transient());
        assert!(!StorageError::Permanent("quota".to_string()).is_transient());
    }

    #[test]
    fn test_object_ref_display() {
        assert_eq!(ObjectRef::new("archive", "a.md").to_string(), "archive/a.md");
    }
}
