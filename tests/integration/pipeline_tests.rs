//! Content extraction and the full pipeline over HTTP and SQLite

use crate::common::{html_page, minimal_pdf, mount_html, test_config, TECH_TEXT};
use knowledge_harvester::extract::{
    ContentExtractor, ExtractError, FileHost, HttpContentExtractor, CONTENT_TYPE_BLOG,
    CONTENT_TYPE_OTHER,
};
use knowledge_harvester::pipeline::ErrorKind;
use knowledge_harvester::storage::SqliteKnowledgeStore;
use knowledge_harvester::{Pipeline, PipelineOutcome};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor() -> HttpContentExtractor {
    HttpContentExtractor::new(Duration::from_secs(5), vec!["HarvestTest/1.0".to_string()], 10_000)
        .expect("client should build")
}

#[tokio::test]
async fn test_extracts_html_article() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let html = r#"<html><head><title>Release Notes</title>
        <meta name="author" content="Grace Hopper"></head>
        <body><nav>Home</nav><main><p>New   compiler
        release.</p></main></body></html>"#;
    mount_html(&server, "/notes", html.to_string()).await;

    let content = extractor().extract(&format!("{}/notes", server.uri())).await?;

    assert_eq!(content.title, "Release Notes");
    assert_eq!(content.text, "New compiler release.");
    assert_eq!(content.author.as_deref(), Some("Grace Hopper"));
    assert_eq!(content.content_type, CONTENT_TYPE_BLOG);
    Ok(())
}

#[tokio::test]
async fn test_extracts_plain_text() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/readme.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("Setup Guide\n\nRun the server.", "text/plain"),
        )
        .mount(&server)
        .await;

    let content = extractor().extract(&format!("{}/readme.txt", server.uri())).await?;

    assert_eq!(content.title, "Setup Guide");
    assert_eq!(content.text, "Setup Guide Run the server.");
    assert_eq!(content.content_type, CONTENT_TYPE_OTHER);
    Ok(())
}

#[tokio::test]
async fn test_archive_is_unsupported_and_404_is_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bundle.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK\x03\x04".to_vec(), "application/zip"))
        .mount(&server)
        .await;

    let archive = extractor().extract(&format!("{}/bundle.zip", server.uri())).await;
    assert!(matches!(archive, Err(ExtractError::Unsupported { .. })));

    let missing = extractor().extract(&format!("{}/missing", server.uri())).await;
    assert_eq!(missing, Err(ExtractError::Status { status: 404 }));
}

#[tokio::test]
async fn test_extracts_pdf_text() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/whitepaper.pdf"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                minimal_pdf(&["Storage Engine Whitepaper", "Compaction runs in the background."]),
                "application/pdf",
            ),
        )
        .mount(&server)
        .await;

    let content = extractor()
        .extract(&format!("{}/whitepaper.pdf", server.uri()))
        .await?;

    assert!(content.title.contains("Storage Engine Whitepaper"));
    assert!(!content.title.contains("Compaction"));
    assert!(content.text.contains("Compaction runs in the background."));
    assert_eq!(content.content_type, CONTENT_TYPE_OTHER);
    Ok(())
}

#[tokio::test]
async fn test_hosted_file_uses_direct_download() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uc"))
        .and(query_param("export", "download"))
        .and(query_param("id", "abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("Design Doc\n\nThe database shards by tenant.", "text/plain"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/d/abc123/view"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            html_page("Viewer", &[], "Sign in to view"),
            "text/html",
        ))
        .expect(0)
        .mount(&server)
        .await;

    let content = extractor()
        .with_file_host(FileHost::at(&server.uri())?)
        .extract(&format!("{}/file/d/abc123/view", server.uri()))
        .await?;

    assert_eq!(content.title, "Design Doc");
    assert_eq!(content.url, format!("{}/file/d/abc123/view", server.uri()));
    Ok(())
}

#[tokio::test]
async fn test_hosted_file_falls_back_to_page_scrape() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uc"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/file/d/xyz789/view",
        html_page("Shared Runbook", &[], TECH_TEXT),
    )
    .await;

    let content = extractor()
        .with_file_host(FileHost::at(&server.uri())?)
        .extract(&format!("{}/file/d/xyz789/view", server.uri()))
        .await?;

    assert_eq!(content.title, "Shared Runbook");
    assert_eq!(content.text, TECH_TEXT);
    Ok(())
}

#[tokio::test]
async fn test_pipeline_saves_once_per_team_and_url() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/blog/launch",
        html_page(
            "Launch Day",
            &["/blog/next", "/blog/next/", "https://elsewhere.org/x", "/blog/launch"],
            TECH_TEXT,
        ),
    )
    .await;

    let dir = tempdir()?;
    let config = test_config(&server.uri(), dir.path(), "cooperative");
    let store = Arc::new(SqliteKnowledgeStore::new(&dir.path().join("knowledge.db"))?);
    let pipeline = Pipeline::with_store(&config, store.clone())?;

    let url = format!("{}/blog/launch", server.uri());
    let first = pipeline.run(&url).await;
    assert_eq!(first.outcome, PipelineOutcome::Saved { items: 1 });
    assert_eq!(first.subpages, vec![format!("{}/blog/next", server.uri())]);

    let second = pipeline.run(&url).await;
    assert_eq!(second.outcome, PipelineOutcome::Saved { items: 0 });

    let items = store.items_for_team("team-test")?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item.title, "Launch Day");
    assert!(items[0].item.content.starts_with("# Launch Day"));
    assert_eq!(items[0].item.user_id.as_deref(), Some("tester"));
    Ok(())
}

#[tokio::test]
async fn test_pipeline_rejects_non_technical_content() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/picnic",
        html_page("Company Picnic", &[], "We had sandwiches in the park and it was sunny."),
    )
    .await;

    let dir = tempdir()?;
    let config = test_config(&server.uri(), dir.path(), "cooperative");
    let store = Arc::new(SqliteKnowledgeStore::new_in_memory()?);
    let pipeline = Pipeline::with_store(&config, store.clone())?;

    let result = pipeline.run(&format!("{}/picnic", server.uri())).await;

    assert_eq!(result.outcome, PipelineOutcome::Rejected);
    assert!(result.content_extracted);
    assert!(store.items_for_team("team-test")?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_pipeline_server_error_is_transient_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempdir()?;
    let config = test_config(&server.uri(), dir.path(), "cooperative");
    let pipeline = Pipeline::with_store(&config, Arc::new(SqliteKnowledgeStore::new_in_memory()?))?;

    let result = pipeline.run(&format!("{}/flaky", server.uri())).await;

    assert!(matches!(
        result.outcome,
        PipelineOutcome::Failed {
            kind: ErrorKind::TransientFetch,
            ..
        }
    ));
    assert_eq!(result.error().as_deref(), Some("transient-fetch: HTTP status 503"));
    Ok(())
}
