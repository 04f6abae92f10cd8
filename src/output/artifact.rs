//! Artifacts: named, timestamped output blobs
//!
//! Both artifacts of a run share the base name `{prefix}{version}_{YYYYmmdd_HHMMSS}`;
//! the structured one ends in `.json`, the narrative one in `.md`.

use crate::model::Document;
use crate::output::markdown::render_narrative;
use crate::output::structured::render_structured;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

/// Which rendering an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Structured,
    Narrative,
}

impl ArtifactKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Structured => "json",
            Self::Narrative => "md",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::Narrative => write!(f, "narrative"),
        }
    }
}

/// A rendered output ready to be written or uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// File name including extension
    pub name: String,
    pub kind: ArtifactKind,
    pub created_at: DateTime<Utc>,
    pub bytes: Vec<u8>,
    /// SHA-256 of `bytes`, hex encoded
    pub fingerprint: String,
}

impl Artifact {
    pub fn new(base_name: &str, kind: ArtifactKind, bytes: Vec<u8>, created_at: DateTime<Utc>) -> Self {
        Self {
            name: format!("{}.{}", base_name, kind.extension()),
            kind,
            created_at,
            fingerprint: fingerprint(&bytes),
            bytes,
        }
    }

    /// Wraps bytes read back from disk, e.g. for publish-only runs
    pub fn from_existing(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let kind = if name.ends_with(".json") {
            ArtifactKind::Structured
        } else {
            ArtifactKind::Narrative
        };
        Self {
            name,
            kind,
            created_at: Utc::now(),
            fingerprint: fingerprint(&bytes),
            bytes,
        }
    }
}

/// The two artifacts produced from one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub structured: Artifact,
    pub narrative: Artifact,
}

impl ArtifactSet {
    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        [&self.structured, &self.narrative].into_iter()
    }
}

/// Hex-encoded SHA-256 of `bytes`
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Name shared by every artifact of one version: `{prefix}{version}_`
pub fn version_prefix(prefix: &str, version: &str) -> String {
    format!("{}{}_", prefix, version.trim_matches('/').replace('/', "_"))
}

/// Base name for artifacts created at `at`
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use mambu_docs::output::base_name;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
/// assert_eq!(base_name("mambu_api_", "v2", at), "mambu_api_v2_20240301_090507");
/// ```
pub fn base_name(prefix: &str, version: &str, at: DateTime<Utc>) -> String {
    format!("{}{}", version_prefix(prefix, version), at.format("%Y%m%d_%H%M%S"))
}

/// Renders both artifacts of a document
///
/// The timestamp in the names is the document's generation time.
pub fn render_artifacts(document: &Document, prefix: &str) -> Result<ArtifactSet, serde_json::Error> {
    let created_at = document.generated_at;
    let base = base_name(prefix, &document.version, created_at);

    Ok(ArtifactSet {
        structured: Artifact::new(
            &base,
            ArtifactKind::Structured,
            render_structured(document)?,
            created_at,
        ),
        narrative: Artifact::new(
            &base,
            ArtifactKind::Narrative,
            render_narrative(document).into_bytes(),
            created_at,
        ),
    })
}
