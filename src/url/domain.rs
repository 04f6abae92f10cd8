use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use mambu_docs::url::extract_domain;
///
/// let url = Url::parse("https://API.MAMBU.COM/#/v2").unwrap();
/// assert_eq!(extract_domain(&url), Some("api.mambu.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs are served by the same host and port
///
/// A leading `www.` is ignored so that links into the bare and `www`
/// variants of the documentation site stay in scope.
pub fn same_site(a: &Url, b: &Url) -> bool {
    let host = |url: &Url| {
        extract_domain(url).map(|h| h.strip_prefix("www.").map(str::to_string).unwrap_or(h))
    };
    host(a).is_some() && host(a) == host(b) && a.port_or_known_default() == b.port_or_known_default()
}
