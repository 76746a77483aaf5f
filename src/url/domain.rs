use url::Url;

/// Extracts the lower-cased host of a URL string
///
/// # Examples
///
/// ```
/// use knowledge_harvester::url::extract_domain;
///
/// assert_eq!(extract_domain("https://EXAMPLE.COM/path"), Some("example.com".to_string()));
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}

/// Host plus explicit port, the unit of "same site" comparison
fn site_key(url: &str) -> Option<(String, Option<u16>)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some((host, parsed.port_or_known_default()))
}

/// Returns true when both URLs point at the same host and port
///
/// Subdomains count as different sites. Unparseable input is never the
/// same domain as anything.
pub fn same_domain(a: &str, b: &str) -> bool {
    match (site_key(a), site_key(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// File-name friendly stem for a target URL (`https://www.a.io/x` -> `a.io`)
pub fn domain_stem(url: &str) -> Option<String> {
    let domain = extract_domain(url)?;
    let stem = domain.strip_prefix("www.").unwrap_or(&domain);
    Some(stem.replace(':', "_"))
}
