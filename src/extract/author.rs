//! Best-effort author detection
//!
//! Output is advisory: `None` is always an acceptable answer and nothing
//! here may fail the pipeline.

use crate::crawler::element_text;
use scraper::{Html, Selector};

const AUTHOR_SELECTORS: &[&str] = &[
    ".author",
    ".byline",
    ".post-author",
    ".entry-author",
    "[rel=author]",
    ".author-name",
    ".writer",
];

/// Longest plausible author string
const MAX_AUTHOR_LEN: usize = 100;

/// Looks for an author in common byline elements, then in `<meta name="author">`
pub fn extract_author(document: &Html) -> Option<String> {
    for selector in AUTHOR_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(author) = clean_author(&element_text(element)) {
                return Some(author);
            }
        }
    }

    let meta = Selector::parse(r#"meta[name="author"]"#).ok()?;
    document
        .select(&meta)
        .filter_map(|element| element.value().attr("content"))
        .find_map(clean_author)
}

fn clean_author(raw: &str) -> Option<String> {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed
        .strip_prefix("By ")
        .or_else(|| collapsed.strip_prefix("by "))
        .unwrap_or(&collapsed)
        .trim();

    if trimmed.is_empty() || trimmed.chars().count() > MAX_AUTHOR_LEN {
        None
    } else {
        Some(trimmed.to_string())
    }
}
