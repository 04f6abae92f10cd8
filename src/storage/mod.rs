//! Storage module for persisting artifacts
//!
//! This module handles:
//! - The remote object store seam (`ObjectStore`) and its errors
//! - A directory-tree implementation for mounted shared drives
//! - Local persistence of artifacts in the output directory

mod fs;
mod local;
mod traits;

pub use fs::FsObjectStore;
pub use local::LocalArtifactWriter;
pub use traits::{ObjectRef, ObjectStore, StorageError, StorageResult};
