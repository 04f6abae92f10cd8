//! Document model shared by extraction, rendering and publishing
//!
//! - `Page`: one extracted documentation page (prose or endpoint)
//! - `Endpoint`, `Parameter`, `ResponseExample`: endpoint-specific content
//! - `Document`: the ordered collection for one API version
//! - `LanguageFilter`: which code-sample languages are retained

mod document;
mod language;

pub use document::{
    Document, Endpoint, HttpMethod, Page, Parameter, ParameterLocation, ResponseExample,
};
pub use language::{canonical_language, LanguageFilter, KNOWN_LANGUAGES};
