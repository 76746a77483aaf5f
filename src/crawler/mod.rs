//! Crawler module for discovering the pages of a target site
//!
//! This module contains:
//! - HTTP fetching with rotating client identifiers
//! - HTML parsing and link extraction
//! - The single-pass crawl loop and its persistence into the URL list

mod coordinator;
mod fetcher;
mod parser;

pub use coordinator::{
    classify_page, crawl_target, CrawlLoop, CrawlReport, CrawlSeeds, FoundPage, PageKind,
};
pub use fetcher::{
    build_http_client, FetchAdapter, FetchError, FetchedPage, HttpFetcher, UserAgentRotation,
};
pub use parser::{parse_html, ParsedPage};

pub(crate) use fetcher::{content_type_of, send_get};
pub(crate) use parser::{body_text, document_title, element_text};
