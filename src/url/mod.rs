//! URL handling: normalization, domain comparison and link scoping

mod domain;
mod filter;
mod normalize;

use regex::Regex;

pub use domain::{domain_stem, extract_domain, same_domain};
pub use filter::{LinkFilter, Rejection, SkipWords, DEFAULT_SKIP_WORDS};
pub use normalize::{normalize_url, NormalizedUrl};

const TEXT_URL_PATTERN: &str =
    r"https?://[-\w.]+(?::\d+)?(?:/[-\w/.~%]*)?(?:\?[-\w&=%.]*)?(?:#[-\w.]*)?";

/// Pulls http(s) URLs out of free text, in order of appearance, without duplicates
///
/// Trailing sentence punctuation is not considered part of the URL.
///
/// # Examples
///
/// ```
/// use knowledge_harvester::url::extract_urls_from_text;
///
/// let urls = extract_urls_from_text("See https://a.io/blog. Also https://a.io/blog and http://b.io.");
/// assert_eq!(urls, vec!["https://a.io/blog", "http://b.io"]);
/// ```
pub fn extract_urls_from_text(text: &str) -> Vec<String> {
    let Ok(pattern) = Regex::new(TEXT_URL_PATTERN) else {
        return Vec::new();
    };

    let mut urls: Vec<String> = Vec::new();
    for found in pattern.find_iter(text) {
        let url = found.as_str().trim_end_matches(['.', ',']).to_string();
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}
