//! URL handling module for Mambu-Docs
//!
//! This module provides URL canonicalization, domain extraction and
//! version-scope matching for documentation routes.

mod domain;
mod matcher;
mod normalize;

use ::url::Url;

pub use domain::{extract_domain, same_site};
pub use matcher::in_version_scope;
pub use normalize::{canonicalize, canonicalize_url, route_path};

/// Returns true if `candidate` belongs to the crawl scope anchored at `base`
///
/// In scope means same site and a route under `version_filter`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use mambu_docs::url::in_scope;
///
/// let base = Url::parse("https://api.mambu.com/#/v2").unwrap();
/// let loans = Url::parse("https://api.mambu.com/#/v2/loans").unwrap();
/// let v1 = Url::parse("https://api.mambu.com/#/v1/loans").unwrap();
///
/// assert!(in_scope(&base, &loans, "/v2"));
/// assert!(!in_scope(&base, &v1, "/v2"));
/// ```
pub fn in_scope(base: &Url, candidate: &Url, version_filter: &str) -> bool {
    same_site(base, candidate) && in_version_scope(version_filter, &route_path(candidate))
}
