//! Crawl loop against a live mock site

use crate::common::{html_page, mount_html, test_config, TECH_TEXT};
use knowledge_harvester::crawler::{crawl_target, CrawlSeeds, HttpFetcher};
use knowledge_harvester::storage::{FileFrontierStore, FrontierList, FrontierStore};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_trailing_slash_pages_are_one_entry() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_html(&server, "/", html_page("Home", &["/about", "/about/"], TECH_TEXT)).await;
    mount_html(&server, "/about", html_page("About", &["/", "/about/"], TECH_TEXT)).await;
    mount_html(&server, "/about/", html_page("About", &["/about"], TECH_TEXT)).await;

    let dir = tempdir()?;
    let config = test_config(&server.uri(), dir.path(), "worker-pool");
    let fetcher = HttpFetcher::from_config(&config.crawler)?;
    let frontier = FileFrontierStore::for_target(&config.storage.url_directory, &config.target.url)?;

    let report = crawl_target(&config, &fetcher, &frontier, &CrawlSeeds::default()).await?;

    assert_eq!(report.visited, 2);
    assert_eq!(report.pages.len(), 2);
    assert!(report.errors.is_empty());
    assert_eq!(frontier.load_set(FrontierList::Authoritative)?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_failed_fetch_is_recorded_and_crawl_continues() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_html(&server, "/", html_page("Home", &["/broken", "/docs"], TECH_TEXT)).await;
    mount_html(&server, "/docs", html_page("Docs", &[], TECH_TEXT)).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempdir()?;
    let config = test_config(&server.uri(), dir.path(), "worker-pool");
    let fetcher = HttpFetcher::from_config(&config.crawler)?;
    let frontier = FileFrontierStore::for_target(&config.storage.url_directory, &config.target.url)?;

    let report = crawl_target(&config, &fetcher, &frontier, &CrawlSeeds::default()).await?;

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].0.ends_with("/broken"));
    assert_eq!(report.errors[0].1, "HTTP status 500");
    Ok(())
}

#[tokio::test]
async fn test_seeds_are_persisted_without_duplicates() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_html(&server, "/", html_page("Home", &[], TECH_TEXT)).await;

    let dir = tempdir()?;
    let config = test_config(&server.uri(), dir.path(), "worker-pool");
    let fetcher = HttpFetcher::from_config(&config.crawler)?;
    let frontier = FileFrontierStore::for_target(&config.storage.url_directory, &config.target.url)?;

    let seeds = CrawlSeeds {
        urls: vec![format!("{}/", server.uri())],
        text: Some("See https://docs.example.org/start and https://docs.example.org/start.".to_string()),
    };
    let report = crawl_target(&config, &fetcher, &frontier, &seeds).await?;

    assert_eq!(report.persisted, 2);
    let list = frontier.load_set(FrontierList::Authoritative)?;
    assert_eq!(list.len(), 2);
    assert!(list.contains(&"https://docs.example.org/start".to_string()));
    Ok(())
}
