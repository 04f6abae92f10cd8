//! Output module for assembling and rendering crawl results
//!
//! This module handles:
//! - Ordering extracted pages into a document (`assembler`)
//! - The structured JSON artifact and the narrative Markdown artifact
//! - Artifact naming and fingerprints
//! - Run summaries

mod artifact;
mod assembler;
mod markdown;
mod structured;
pub mod stats;

pub use artifact::{
    base_name, fingerprint, render_artifacts, version_prefix, Artifact, ArtifactKind, ArtifactSet,
};
pub use assembler::{assemble, outline, CollectedPage, OutlineEntry, OutlineTarget, Slugger};
pub use markdown::{document_title, render_narrative};
pub use stats::{print_summary, CrawlSummary, FailureRecord};
pub use structured::{parse_structured, render_structured};
