//! Whole sessions through `harvest`

use crate::common::{html_page, mount_html, test_config, test_config_toml, TECH_TEXT};
use knowledge_harvester::executor::BatchStatus;
use knowledge_harvester::storage::{FileFrontierStore, FrontierList, FrontierStore};
use knowledge_harvester::{harvest, harvest_from_file, HarvestError, SessionOutcome, SessionReport};
use std::path::Path;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

async fn two_page_site() -> MockServer {
    let server = MockServer::start().await;
    mount_html(&server, "/guide", html_page("Guide", &["/guide/setup"], TECH_TEXT)).await;
    mount_html(&server, "/guide/setup", html_page("Setup", &["/guide"], TECH_TEXT)).await;
    server
}

fn seed_list(server: &MockServer, dir: &Path, mode: &str) -> anyhow::Result<FileFrontierStore> {
    let config = test_config(&server.uri(), dir, mode);
    let frontier = FileFrontierStore::for_target(&config.storage.url_directory, &config.target.url)?;
    frontier.save_set(FrontierList::Authoritative, &[format!("{}/guide", server.uri())])?;
    Ok(frontier)
}

async fn run(server: &MockServer, mode: &str) -> anyhow::Result<(SessionReport, Vec<String>)> {
    let dir = tempdir()?;
    let frontier = seed_list(server, dir.path(), mode)?;
    let config = test_config(&server.uri(), dir.path(), mode);

    let report = match harvest(config, CancellationToken::new()).await? {
        SessionOutcome::Completed(report) => report,
        other => anyhow::bail!("session did not complete: {:?}", other),
    };
    assert!(!frontier.path(FrontierList::Discovered).exists());

    Ok((report, frontier.load_set(FrontierList::Authoritative)?))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_pool_session_reaches_fixed_point() -> anyhow::Result<()> {
    let server = two_page_site().await;
    let (report, list) = run(&server, "worker-pool").await?;

    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.rounds.len(), 2);
    assert_eq!(report.stats.iterations, 2);
    assert_eq!(report.stats.processed, 2);
    assert_eq!(report.stats.saved, 2);
    assert_eq!(
        list,
        vec![format!("{}/guide", server.uri()), format!("{}/guide/setup", server.uri())]
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_executors_agree() -> anyhow::Result<()> {
    let server = two_page_site().await;
    let (pool, pool_list) = run(&server, "worker-pool").await?;
    let (cooperative, cooperative_list) = run(&server, "cooperative").await?;

    assert_eq!(pool.stats.attempted(), cooperative.stats.attempted());
    assert_eq!(pool.stats.discovered, cooperative.stats.discovered);
    assert_eq!(pool_list, cooperative_list);
    Ok(())
}

#[tokio::test]
async fn test_session_from_config_file() -> anyhow::Result<()> {
    let server = two_page_site().await;
    let dir = tempdir()?;
    let frontier = seed_list(&server, dir.path(), "cooperative")?;
    let config_path = dir.path().join("harvest.toml");
    std::fs::write(&config_path, test_config_toml(&server.uri(), dir.path(), "cooperative"))?;

    let outcome = harvest_from_file(&config_path, CancellationToken::new()).await?;

    assert!(outcome.is_completed());
    assert_eq!(outcome.stats().map(|s| s.saved), Some(2));
    assert_eq!(frontier.load_set(FrontierList::Authoritative)?.len(), 2);

    let missing = harvest_from_file(&dir.path().join("absent.toml"), CancellationToken::new()).await;
    assert!(matches!(missing, Err(HarvestError::Config(_))));
    Ok(())
}

#[tokio::test]
async fn test_empty_list_is_no_work() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    let dir = tempdir()?;
    let config = test_config(&server.uri(), dir.path(), "cooperative");

    let outcome = harvest(config, CancellationToken::new()).await?;

    assert!(matches!(outcome, SessionOutcome::NoWork { .. }));
    Ok(())
}

#[tokio::test]
async fn test_stopped_session_keeps_discovered_list() -> anyhow::Result<()> {
    let server = two_page_site().await;
    let dir = tempdir()?;
    let frontier = seed_list(&server, dir.path(), "cooperative")?;
    let config = test_config(&server.uri(), dir.path(), "cooperative");

    let stop = CancellationToken::new();
    stop.cancel();
    let outcome = harvest(config, stop).await?;

    match outcome {
        SessionOutcome::Completed(report) => {
            assert_eq!(report.status, BatchStatus::Cancelled);
            assert!(report.rounds.is_empty());
        }
        other => anyhow::bail!("unexpected outcome: {:?}", other),
    }
    assert_eq!(frontier.load_set(FrontierList::Authoritative)?.len(), 1);
    Ok(())
}
