//! Crawl loop - single-pass breadth-first traversal of the target site
//!
//! The loop owns a [`FrontierState`], asks the fetch adapter for each
//! dequeued page, scopes the discovered links through the [`LinkFilter`]
//! and stops when the queue drains or the page quota is reached. Every
//! fetch counts against the quota, failed ones included. Fetch errors are
//! recorded and the loop moves on.

use crate::config::Config;
use crate::crawler::fetcher::FetchAdapter;
use crate::state::FrontierState;
use crate::storage::{FrontierList, FrontierStore};
use crate::url::{extract_urls_from_text, same_domain, LinkFilter, NormalizedUrl, SkipWords};
use crate::HarvestError;
use std::collections::BTreeSet;
use std::time::Duration;

/// Keywords that mark a page as part of a blog or newsroom
const BLOG_KEYWORDS: &[&str] = &[
    "blog", "news", "articles", "insights", "thoughts", "updates", "press", "media", "stories",
    "journal", "diary", "notes",
];

/// Phrases typical of article bodies
const BLOG_INDICATORS: &[&str] = &["published", "author", "date", "read more", "continue reading"];

/// What kind of page the crawl found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Page,
    Blog,
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FoundPage {
    pub url: String,
    pub title: Option<String>,
    pub kind: PageKind,
}

/// Result of one crawl pass
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Pages fetched successfully, in crawl order
    pub pages: Vec<FoundPage>,

    /// Distinct normalized URLs dequeued during the pass
    pub visited: usize,

    /// Links that passed the filter and were queued
    pub discovered: BTreeSet<NormalizedUrl>,

    /// `(url, message)` for every failed fetch
    pub errors: Vec<(String, String)>,

    /// URLs newly appended to the authoritative list
    pub persisted: usize,
}

impl CrawlReport {
    pub fn blog_pages(&self) -> impl Iterator<Item = &FoundPage> {
        self.pages.iter().filter(|p| p.kind == PageKind::Blog)
    }
}

/// Classifies a page as blog-like from its URL, title and body text
pub fn classify_page(url: &str, title: Option<&str>, text: &str) -> PageKind {
    let url = url.to_lowercase();
    let title = title.unwrap_or("").to_lowercase();

    if BLOG_KEYWORDS
        .iter()
        .any(|k| url.contains(k) || title.contains(k))
    {
        return PageKind::Blog;
    }

    let text = text.to_lowercase();
    if BLOG_INDICATORS.iter().any(|i| text.contains(i)) {
        PageKind::Blog
    } else {
        PageKind::Page
    }
}

/// Single-pass crawler bounded by a page quota
pub struct CrawlLoop<'a> {
    fetcher: &'a dyn FetchAdapter,
    filter: &'a LinkFilter,
    max_pages: usize,
    delay: Duration,
}

impl<'a> CrawlLoop<'a> {
    pub fn new(
        fetcher: &'a dyn FetchAdapter,
        filter: &'a LinkFilter,
        max_pages: usize,
        delay: Duration,
    ) -> Self {
        Self {
            fetcher,
            filter,
            max_pages,
            delay,
        }
    }

    /// Crawls from `start_url` until the queue drains or `max_pages` fetches were made
    pub async fn run(&self, start_url: &str) -> Result<CrawlReport, HarvestError> {
        let mut frontier = FrontierState::new(start_url);
        let mut report = CrawlReport::default();
        let mut requests = 0usize;

        tracing::info!(
            "Crawling {} (max {} pages, {}ms delay)",
            start_url,
            self.max_pages,
            self.delay.as_millis()
        );

        while requests < self.max_pages {
            let Some(next) = frontier.dequeue()? else {
                tracing::debug!("Frontier is empty, crawl complete");
                break;
            };

            if !same_domain(&next.url, start_url) {
                tracing::debug!("Skipping off-domain URL {}", next.url);
                frontier.mark_expanded(&next.normalized)?;
                continue;
            }

            if requests > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            requests += 1;

            match self.fetcher.fetch(&next.url).await {
                Ok(page) => {
                    for link in &page.links {
                        if frontier.is_known(link) {
                            continue;
                        }
                        match self.filter.check(link, start_url) {
                            Ok(()) => {
                                frontier.enqueue(link);
                            }
                            Err(reason) => {
                                tracing::trace!("Filtered {}: {}", link, reason);
                            }
                        }
                    }

                    report.pages.push(FoundPage {
                        url: next.url.clone(),
                        kind: classify_page(&next.url, page.title.as_deref(), &page.text),
                        title: page.title,
                    });
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {}: {}", next.url, e);
                    report.errors.push((next.url.clone(), e.to_string()));
                }
            }

            frontier.mark_expanded(&next.normalized)?;

            if requests % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages found, {} queued, {} errors",
                    report.pages.len(),
                    frontier.queue_len(),
                    report.errors.len()
                );
            }
        }

        report.visited = frontier.visited().len();
        report.discovered = frontier.discovered().clone();

        tracing::info!(
            "Crawl of {} finished: {} pages ({} blog), {} visited, {} errors",
            start_url,
            report.pages.len(),
            report.blog_pages().count(),
            report.visited,
            report.errors.len()
        );

        Ok(report)
    }
}

/// Extra seeds supplied alongside a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSeeds {
    /// URLs added to the list verbatim
    pub urls: Vec<String>,

    /// Free text that URLs are extracted from
    pub text: Option<String>,
}

/// Crawls the configured target and appends the results to its URL list
///
/// The authoritative list receives the found pages followed by any extra
/// seeds; entries already present (by normalized form) are not repeated.
pub async fn crawl_target(
    config: &Config,
    fetcher: &dyn FetchAdapter,
    frontier_store: &dyn FrontierStore,
    seeds: &CrawlSeeds,
) -> Result<CrawlReport, HarvestError> {
    let skip_words = SkipWords::new(
        &config.crawler.skip_words,
        &config.target.name,
        &config.target.url,
    );
    let filter = LinkFilter::new(skip_words)
        .map_err(|e| crate::ConfigError::InvalidPattern(e.to_string()))?;

    let crawl = CrawlLoop::new(
        fetcher,
        &filter,
        config.crawler.max_pages,
        config.crawler.request_delay(),
    );
    let mut report = crawl.run(&config.target.url).await?;

    let mut urls: Vec<String> = report.pages.iter().map(|p| p.url.clone()).collect();
    urls.extend(seeds.urls.iter().cloned());
    if let Some(text) = &seeds.text {
        urls.extend(extract_urls_from_text(text));
    }

    report.persisted = frontier_store.append_set(FrontierList::Authoritative, &urls)?;
    tracing::info!(
        "Appended {} new URLs to the list for {}",
        report.persisted,
        config.target.name
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchError, FetchedPage};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned link lists and records every fetch
    struct SiteMap {
        pages: HashMap<String, Vec<String>>,
        fetched: Mutex<Vec<String>>,
    }

    impl SiteMap {
        fn new(pages: &[(&str, &[&str])]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, links)| {
                        (url.to_string(), links.iter().map(|l| l.to_string()).collect())
                    })
                    .collect(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FetchAdapter for SiteMap {
        async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
            self.fetched.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(links) => Ok(FetchedPage {
                    final_url: url.to_string(),
                    status: 200,
                    content_type: "text/html".to_string(),
                    title: Some(format!("Title of {}", url)),
                    links: links.clone(),
                    text: String::new(),
                }),
                None => Err(FetchError::Status { status: 404 }),
            }
        }
    }

    fn filter() -> LinkFilter {
        LinkFilter::new(SkipWords::new(&[], "Example", "https://example.com")).unwrap()
    }

    #[tokio::test]
    async fn test_trailing_slash_variants_visited_once() {
        let site = SiteMap::new(&[
            (
                "https://example.com/",
                &["https://example.com/about", "https://example.com/about/"],
            ),
            (
                "https://example.com/about",
                &["https://example.com/", "https://example.com/about/"],
            ),
        ]);
        let filter = filter();
        let crawl = CrawlLoop::new(&site, &filter, 10, Duration::ZERO);

        let report = crawl.run("https://example.com/").await.unwrap();

        assert_eq!(report.visited, 2);
        assert_eq!(report.pages.len(), 2);
        assert_eq!(
            site.fetched(),
            vec!["https://example.com/", "https://example.com/about"]
        );
    }

    #[tokio::test]
    async fn test_page_quota_stops_crawl() {
        let site = SiteMap::new(&[
            (
                "https://example.com/",
                &[
                    "https://example.com/a",
                    "https://example.com/b",
                    "https://example.com/c",
                ],
            ),
            ("https://example.com/a", &[]),
            ("https://example.com/b", &[]),
            ("https://example.com/c", &[]),
        ]);
        let filter = filter();
        let crawl = CrawlLoop::new(&site, &filter, 2, Duration::ZERO);

        let report = crawl.run("https://example.com/").await.unwrap();
        assert_eq!(report.pages.len(), 2);
        assert_eq!(site.fetched().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetches_count_toward_quota() {
        let dead: Vec<String> = (0..8).map(|i| format!("https://example.com/dead-{}", i)).collect();
        let links: Vec<&str> = dead.iter().map(String::as_str).collect();
        let site = SiteMap::new(&[("https://example.com/", &links)]);
        let filter = filter();
        let crawl = CrawlLoop::new(&site, &filter, 2, Duration::ZERO);

        let report = crawl.run("https://example.com/").await.unwrap();

        assert_eq!(site.fetched().len(), 2);
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_errors_are_recorded_not_fatal() {
        let site = SiteMap::new(&[
            (
                "https://example.com/",
                &["https://example.com/missing", "https://example.com/ok"],
            ),
            ("https://example.com/ok", &[]),
        ]);
        let filter = filter();
        let crawl = CrawlLoop::new(&site, &filter, 10, Duration::ZERO);

        let report = crawl.run("https://example.com/").await.unwrap();
        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.visited, 3);
        assert_eq!(
            report.errors,
            vec![(
                "https://example.com/missing".to_string(),
                "HTTP status 404".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_off_domain_and_skip_word_links_not_followed() {
        let site = SiteMap::new(&[(
            "https://example.com/",
            &[
                "https://other.com/",
                "https://example.com/privacy",
                "https://example.com/logo.png",
            ],
        )]);
        let filter = filter();
        let crawl = CrawlLoop::new(&site, &filter, 10, Duration::ZERO);

        let report = crawl.run("https://example.com/").await.unwrap();
        assert_eq!(site.fetched(), vec!["https://example.com/"]);
        assert!(report.discovered.is_empty());
    }

    #[test]
    fn test_classify_page() {
        assert_eq!(
            classify_page("https://example.com/blog/post", None, ""),
            PageKind::Blog
        );
        assert_eq!(
            classify_page("https://example.com/x", Some("Company News"), ""),
            PageKind::Blog
        );
        assert_eq!(
            classify_page("https://example.com/x", None, "Published by the author"),
            PageKind::Blog
        );
        assert_eq!(
            classify_page("https://example.com/x", Some("Release"), "Continue reading below"),
            PageKind::Blog
        );
        assert_eq!(
            classify_page("https://example.com/pricing", Some("Pricing"), "Plans"),
            PageKind::Page
        );
    }
}
