//! End-to-end tests against mock HTTP servers and on-disk stores

mod common;
mod crawl_tests;
mod discovery_tests;
mod pipeline_tests;
