use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during canonicalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Canonicalizes a URL into the key used for visited tracking
///
/// # Canonicalization Steps
///
/// 1. Parse the URL; reject if malformed or not http(s)
/// 2. Lowercase the host and remove a `www.` prefix
/// 3. Normalize the path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
/// 4. Keep a fragment only when it is a hash route (starts with `/`),
///    normalized like a path; drop every other fragment
/// 5. Remove tracking query parameters and sort the rest
///
/// Canonicalization is idempotent: canonicalizing a canonical URL returns it
/// unchanged.
///
/// # Examples
///
/// ```
/// use mambu_docs::url::canonicalize;
///
/// let url = canonicalize("https://WWW.Docs.Example/api/v2/#overview").unwrap();
/// assert_eq!(url.as_str(), "https://docs.example/api/v2");
///
/// let url = canonicalize("https://api.mambu.com/#/v2/loans/").unwrap();
/// assert_eq!(url.as_str(), "https://api.mambu.com/#/v2/loans");
/// ```
pub fn canonicalize(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    canonicalize_url(url)
}

/// Canonicalizes an already-parsed URL
pub fn canonicalize_url(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);

    let route = url
        .fragment()
        .filter(|fragment| fragment.starts_with('/'))
        .map(normalize_route)
        .filter(|route| route != "/");
    url.set_fragment(route.as_deref());

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        url.set_query(None);
        if !params.is_empty() {
            // Pairs come back decoded, so they are re-encoded on the way in
            url.query_pairs_mut().extend_pairs(params.iter());
        }
    }

    Ok(url)
}

/// Returns the route a page lives at: the hash route if present, else the path
///
/// # Examples
///
/// ```
/// use url::Url;
/// use mambu_docs::url::route_path;
///
/// let hash_routed = Url::parse("https://api.mambu.com/#/v2/loans").unwrap();
/// assert_eq!(route_path(&hash_routed), "/v2/loans");
///
/// let plain = Url::parse("https://docs.example/api/v2/loans#top").unwrap();
/// assert_eq!(route_path(&plain), "/api/v2/loans");
/// ```
pub fn route_path(url: &Url) -> String {
    match url.fragment() {
        Some(fragment) if fragment.starts_with('/') => {
            let route = fragment.split('?').next().unwrap_or(fragment);
            normalize_path(route)
        }
        _ => url.path().to_string(),
    }
}

/// Normalizes a hash route, keeping any query it carries
fn normalize_route(route: &str) -> String {
    match route.split_once('?') {
        Some((path, query)) if !query.is_empty() => format!("{}?{}", normalize_path(path), query),
        Some((path, _)) => normalize_path(path),
        None => normalize_path(route),
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort();
    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(url: &str) -> String {
        canonicalize(url).unwrap().to_string()
    }

    #[test]
    fn test_scheme_is_preserved() {
        assert_eq!(canon("http://example.com/page"), "http://example.com/page");
    }

    #[test]
    fn test_remove_www_and_lowercase_host() {
        assert_eq!(canon("https://WWW.EXAMPLE.COM/Page"), "https://example.com/Page");
    }

    #[test]
    fn test_trailing_slash_and_fragment_share_key() {
        let a = canon("https://docs.example/api/v2/");
        let b = canon("https://docs.example/api/v2#parameters");
        let c = canon("https://docs.example/api/v2");
        assert_eq!(a, c);
        assert_eq!(b, c);
    }

    #[test]
    fn test_keep_root_slash() {
        assert_eq!(canon("https://example.com"), "https://example.com/");
        assert_eq!(canon("https://example.com/"), "https://example.com/");
    }

    #[test]
    fn test_hash_route_is_kept() {
        assert_eq!(
            canon("https://api.mambu.com/#/v2/clients/"),
            "https://api.mambu.com/#/v2/clients"
        );
        assert_ne!(
            canon("https://api.mambu.com/#/v2/clients"),
            canon("https://api.mambu.com/#/v2/loans")
        );
    }

    #[test]
    fn test_root_hash_route_is_dropped() {
        assert_eq!(canon("https://api.mambu.com/#/"), "https://api.mambu.com/");
    }

    #[test]
    fn test_remove_tracking_params_and_sort() {
        assert_eq!(
            canon("https://example.com/page?b=2&utm_source=x&a=1&fbclid=9"),
            "https://example.com/page?a=1&b=2"
        );
        assert_eq!(
            canon("https://example.com/page?utm_custom=value"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_dot_segments_and_duplicate_slashes() {
        assert_eq!(canon("https://example.com/a/../b/./c"), "https://example.com/b/c");
        assert_eq!(
            canon("https://example.com///path//to///page"),
            "https://example.com/path/to/page"
        );
    }

    #[test]
    fn test_encoded_query_values_survive() {
        assert_eq!(canon("https://docs.example/api/v2?q=a%26b"), "https://docs.example/api/v2?q=a%26b");
        let url = canonicalize("https://docs.example/api/v2?z=1&q=a%26b").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "a&b".to_string()),
                ("z".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "http://WWW.EXAMPLE.COM/a/../b/?utm_source=test#fragment",
            "https://api.mambu.com/#/v2//loans/./schedule/",
            "https://docs.example/api/v2?z=1&a=2#/v2/x?tab=curl",
            "https://example.com",
            "https://example.com/with%20space/",
            "https://docs.example/api/v2?q=a%26b",
            "https://docs.example/api/v2?name=a+b&tag=x%3Dy",
        ];
        for input in inputs {
            let once = canonicalize(input).unwrap();
            let twice = canonicalize(once.as_str()).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", input);
        }
    }

    #[test]
    fn test_invalid_scheme() {
        assert!(matches!(
            canonicalize("ftp://example.com/page"),
            Err(UrlError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(canonicalize("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn test_route_path() {
        let url = canonicalize("https://api.mambu.com/#/v2/loans?tab=curl").unwrap();
        assert_eq!(route_path(&url), "/v2/loans");

        let url = canonicalize("https://docs.example/api/v2/loans").unwrap();
        assert_eq!(route_path(&url), "/api/v2/loans");
    }
}
