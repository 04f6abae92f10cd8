/// Checks if a route lies within a version prefix
///
/// The prefix matches whole segments only, so `/v2` covers `/v2` and
/// `/v2/loans` but not `/v20`. A prefix of `/` covers every route.
///
/// # Arguments
///
/// * `prefix` - The version filter, e.g. `/v2` or `/api/v2`
/// * `route` - The route of a candidate page (see [`route_path`](super::route_path))
///
/// # Examples
///
/// ```
/// use mambu_docs::url::in_version_scope;
///
/// assert!(in_version_scope("/v2", "/v2"));
/// assert!(in_version_scope("/v2", "/v2/loans"));
/// assert!(!in_version_scope("/v2", "/v20/loans"));
/// assert!(!in_version_scope("/v2", "/v1/loans"));
/// ```
pub fn in_version_scope(prefix: &str, route: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }

    match route.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
