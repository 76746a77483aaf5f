use std::fmt;
use url::Url;

/// Canonical form of a URL, used as the only deduplication key
///
/// Built from scheme, host, port, path (trailing slash removed unless the
/// path is the root), query and fragment. Scheme and host compare
/// case-insensitively because the parser lower-cases them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes a URL for equality comparison
///
/// # Normalization Steps
///
/// 1. Parse the URL; anything without a scheme and host is returned unchanged
/// 2. Lowercase scheme and host (done by the parser)
/// 3. Drop the default port, keep any other
/// 4. Strip trailing slashes from the path unless it is the root `/`
/// 5. Keep non-empty query and fragment as-is
///
/// Never fails: malformed input comes back verbatim so it still works as a
/// (unique) set key.
///
/// # Examples
///
/// ```
/// use knowledge_harvester::url::normalize_url;
///
/// assert_eq!(
///     normalize_url("HTTPS://Example.COM/about/").as_str(),
///     "https://example.com/about"
/// );
/// assert_eq!(normalize_url("not a url").as_str(), "not a url");
/// ```
pub fn normalize_url(raw: &str) -> NormalizedUrl {
    match try_normalize(raw) {
        Some(normalized) => NormalizedUrl(normalized),
        None => NormalizedUrl(raw.to_string()),
    }
}

fn try_normalize(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str().filter(|h| !h.is_empty())?;

    let mut normalized = format!("{}://{}", url.scheme(), host.to_lowercase());

    if let Some(port) = url.port() {
        normalized.push(':');
        normalized.push_str(&port.to_string());
    }

    let path = url.path();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        normalized.push('/');
    } else {
        normalized.push_str(trimmed);
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        normalized.push('?');
        normalized.push_str(query);
    }

    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        normalized.push('#');
        normalized.push_str(fragment);
    }

    Some(normalized)
}
