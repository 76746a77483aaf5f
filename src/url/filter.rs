//! Link scoping: skip words and structural rules

use crate::url::domain::{extract_domain, same_domain};
use regex::RegexSet;
use std::fmt;
use url::Url;

/// Skip words applied to every target unless the target itself contains them
pub const DEFAULT_SKIP_WORDS: &[&str] = &[
    "facebook",
    "twitter",
    "linkedin",
    "instagram",
    "youtube",
    "tiktok",
    "pinterest",
    "reddit",
    "whatsapp",
    "login",
    "signin",
    "signup",
    "privacy",
    "terms",
    "cookie",
];

/// Paths that never carry extractable content
const STRUCTURAL_PATTERNS: &[&str] = &[
    r"(?i)\.(pdf|doc|docx|xls|xlsx|ppt|pptx|zip|rar|jpg|jpeg|png|gif|svg|ico|css|js|xml|json)$",
    r"(?i)/(admin|login|logout|register|api|ajax|search|tag|category|author)/",
    r"#.*$",
    r"\?.*$",
];

/// Case-insensitive substring filter with a self-exclusion guard
///
/// A word only excludes a URL when it does not also occur in the target's
/// display name or domain. A target literally named "Login Inc." therefore
/// never has `login` URLs filtered.
#[derive(Debug, Clone)]
pub struct SkipWords {
    words: Vec<String>,
    target_name: String,
    target_domain: String,
}

impl SkipWords {
    /// Merges the built-in list with user supplied words (deduplicated, lower-cased)
    pub fn new(extra: &[String], target_name: &str, target_url: &str) -> Self {
        let mut words: Vec<String> = Vec::new();
        let candidates = DEFAULT_SKIP_WORDS
            .iter()
            .map(|w| w.to_string())
            .chain(extra.iter().cloned());

        for word in candidates {
            let word = word.trim().to_lowercase();
            if !word.is_empty() && !words.contains(&word) {
                words.push(word);
            }
        }

        Self {
            words,
            target_name: target_name.to_lowercase(),
            target_domain: extract_domain(target_url).unwrap_or_else(|| target_url.to_lowercase()),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Returns the first skip word that excludes `url`, if any
    pub fn matching_word(&self, url: &str) -> Option<&str> {
        let lower = url.to_lowercase();
        self.words
            .iter()
            .find(|word| {
                lower.contains(word.as_str())
                    && !self.target_name.contains(word.as_str())
                    && !self.target_domain.contains(word.as_str())
            })
            .map(String::as_str)
    }

    pub fn should_skip(&self, url: &str) -> bool {
        self.matching_word(url).is_some()
    }
}

/// Why a candidate link was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Scheme,
    OffDomain,
    Structural,
    SkipWord(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheme => write!(f, "not http(s)"),
            Self::OffDomain => write!(f, "different domain"),
            Self::Structural => write!(f, "non-content path"),
            Self::SkipWord(word) => write!(f, "skip word '{}'", word),
        }
    }
}

/// Decides whether a discovered link is in scope
///
/// Visited and queued checks belong to the frontier; this only looks at the
/// link itself relative to a scope URL.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    skip_words: SkipWords,
    structural: RegexSet,
}

impl LinkFilter {
    pub fn new(skip_words: SkipWords) -> Result<Self, regex::Error> {
        Ok(Self {
            skip_words,
            structural: RegexSet::new(STRUCTURAL_PATTERNS)?,
        })
    }

    pub fn skip_words(&self) -> &SkipWords {
        &self.skip_words
    }

    /// Checks `candidate` against the scope of `scope_url`
    pub fn check(&self, candidate: &str, scope_url: &str) -> Result<(), Rejection> {
        let scheme_ok = Url::parse(candidate)
            .map(|u| u.scheme() == "http" || u.scheme() == "https")
            .unwrap_or(false);
        if !scheme_ok {
            return Err(Rejection::Scheme);
        }

        if !same_domain(candidate, scope_url) {
            return Err(Rejection::OffDomain);
        }

        if self.structural.is_match(candidate) {
            return Err(Rejection::Structural);
        }

        if let Some(word) = self.skip_words.matching_word(candidate) {
            return Err(Rejection::SkipWord(word.to_string()));
        }

        Ok(())
    }

    pub fn accepts(&self, candidate: &str, scope_url: &str) -> bool {
        self.check(candidate, scope_url).is_ok()
    }
}
