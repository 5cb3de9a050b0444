//! End-to-end crawl tests against mock servers

use crate::{create_test_config, document, html_page};
use std::time::Duration;
use sumi_folio::crawler::{Coordinator, CrawlEvent};
use sumi_folio::storage::PageStore;
use sumi_folio::CrawlState;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, page_path: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_across_hosts() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let base = site.uri();

    mount_page(
        &site,
        "/a",
        document(
            "A",
            &format!(r#"<a href="/b">B</a> <a href="{}/c">C</a>"#, other.uri()),
        ),
        1,
    )
    .await;
    mount_page(&site, "/b", document("B", r#"<a href="/a">back</a>"#), 1).await;
    mount_page(&other, "/c", document("C", "<p>leaf</p>"), 1).await;

    let mut config = create_test_config(&format!("{}/a", base));
    config.crawler.max_depth = 1;

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");
    let storage = coordinator.storage();

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.pages_failed, 0);
    assert_eq!(storage.len(), 3);

    let a = storage.get(&format!("{}/a", base)).unwrap();
    assert_eq!(a.depth, 0);
    assert_eq!(a.title, "A");
    assert_eq!(a.status_code, Some(200));

    assert_eq!(storage.get(&format!("{}/b", base)).unwrap().depth, 1);
    assert_eq!(storage.get(&format!("{}/c", other.uri())).unwrap().depth, 1);
}

#[tokio::test]
async fn test_same_domain_only_skips_other_hosts() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let base = site.uri();

    mount_page(
        &site,
        "/a",
        document(
            "A",
            &format!(r#"<a href="/b">B</a> <a href="{}/c">C</a>"#, other.uri()),
        ),
        1,
    )
    .await;
    mount_page(&site, "/b", document("B", ""), 1).await;
    mount_page(&other, "/c", document("C", ""), 0).await;

    let mut config = create_test_config(&format!("{}/a", base));
    config.crawler.same_domain_only = true;

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(coordinator.storage().len(), 2);
    assert!(!coordinator
        .storage()
        .contains(&format!("{}/c", other.uri())));
}

#[tokio::test]
async fn test_off_host_redirect_not_followed() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/a", document("A", r#"<a href="/b">B</a>"#), 1).await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/c", other.uri()).as_str()),
        )
        .expect(1)
        .mount(&site)
        .await;
    mount_page(&other, "/c", document("C", ""), 0).await;

    let mut config = create_test_config(&format!("{}/a", base));
    config.crawler.same_domain_only = true;
    config.crawler.retry_count = 2;

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");
    let storage = coordinator.storage();

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(report.pages_failed, 1);
    assert!(!storage.contains(&format!("{}/c", other.uri())));

    let b = storage.get(&format!("{}/b", base)).unwrap();
    assert!(b.is_placeholder());
    let error = b.fetch_error.as_deref().unwrap();
    assert!(error.contains("redirected off-host"), "error was: {}", error);
}

#[tokio::test]
async fn test_same_host_redirect_followed() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/a", document("A", r#"<a href="/old">Old</a>"#), 1).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&site)
        .await;
    mount_page(&site, "/new", document("New", "<p>moved</p>"), 1).await;

    let mut config = create_test_config(&format!("{}/a", base));
    config.crawler.same_domain_only = true;

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.pages_failed, 0);
    let storage = coordinator.storage();
    let old = storage.get(&format!("{}/old", base)).unwrap();
    assert_eq!(old.title, "New");
}

#[tokio::test]
async fn test_self_links_fetched_once() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(
        &site,
        "/a",
        document(
            "A",
            &format!(
                r##"<a href="/a">me</a><a href="/a/">me</a><a href="#top">me</a><a href="{}/a?utm_source=x">me</a>"##,
                base
            ),
        ),
        1,
    )
    .await;

    let mut coordinator =
        Coordinator::new(create_test_config(&format!("{}/a", base))).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.urls_discovered, 1);
}

#[tokio::test]
async fn test_diamond_links_fetched_once() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(
        &site,
        "/",
        document("Root", r#"<a href="/x">x</a><a href="/y">y</a>"#),
        1,
    )
    .await;
    mount_page(&site, "/x", document("X", r#"<a href="/z">z</a>"#), 1).await;
    mount_page(&site, "/y", document("Y", r#"<a href="/z">z</a>"#), 1).await;
    mount_page(&site, "/z", document("Z", ""), 1).await;

    let mut config = create_test_config(&base);
    config.crawler.concurrency = 4;

    let mut coordinator = Coordinator::new(config).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.pages_processed, 4);
    assert_eq!(
        coordinator.storage().get(&format!("{}/z", base)).unwrap().depth,
        2
    );
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/0", document("0", r#"<a href="/1">next</a>"#), 1).await;
    mount_page(&site, "/1", document("1", r#"<a href="/2">next</a>"#), 1).await;
    // Should never be requested with max_depth = 1
    mount_page(&site, "/2", document("2", r#"<a href="/3">next</a>"#), 0).await;

    let mut config = create_test_config(&format!("{}/0", base));
    config.crawler.max_depth = 1;

    let mut coordinator = Coordinator::new(config).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");
    let storage = coordinator.storage();

    assert_eq!(report.pages_processed, 2);
    assert!(storage.snapshot().iter().all(|page| page.depth <= 1));
}

#[tokio::test]
async fn test_depth_zero_fetches_only_start() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/", document("Root", r#"<a href="/x">x</a>"#), 1).await;
    mount_page(&site, "/x", document("X", ""), 0).await;

    let mut config = create_test_config(&base);
    config.crawler.max_depth = 0;

    let mut coordinator = Coordinator::new(config).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.pages_processed, 1);
    assert_eq!(report.urls_discovered, 1);
}

#[tokio::test]
async fn test_retries_exhausted_produces_placeholder() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&site)
        .await;

    let mut config = create_test_config(&format!("{}/a", base));
    config.crawler.retry_count = 2;

    let mut coordinator = Coordinator::new(config).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");
    let storage = coordinator.storage();

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(report.pages_failed, 1);

    let page = storage.get(&format!("{}/a", base)).unwrap();
    assert!(page.is_placeholder());
    assert_eq!(page.title, format!("Error: {}/a", base));
    assert_eq!(page.status_code, Some(500));
    let error = page.fetch_error.as_deref().unwrap();
    assert!(error.contains("after 3 attempts"), "error was: {}", error);
}

#[tokio::test]
async fn test_non_html_is_not_retried() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/", document("Root", r#"<a href="/data">data</a>"#), 1).await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&site)
        .await;

    let mut config = create_test_config(&base);
    config.crawler.retry_count = 3;

    let mut coordinator = Coordinator::new(config).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.pages_processed, 2);
    assert_eq!(report.pages_failed, 1);

    let storage = coordinator.storage();
    let data = storage.get(&format!("{}/data", base)).unwrap();
    assert!(data
        .fetch_error
        .as_deref()
        .unwrap()
        .starts_with("Failed to scrape: expected HTML"));
}

#[tokio::test]
async fn test_failed_child_does_not_stop_siblings() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(
        &site,
        "/",
        document("Root", r#"<a href="/bad">bad</a><a href="/good">good</a>"#),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&site)
        .await;
    mount_page(&site, "/good", document("Good", ""), 1).await;

    let mut coordinator = Coordinator::new(create_test_config(&base)).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Completed);
    assert_eq!(report.pages_processed, 3);
    assert_eq!(report.pages_failed, 1);
    assert!(!coordinator
        .storage()
        .get(&format!("{}/good", base))
        .unwrap()
        .is_placeholder());
}

#[tokio::test]
async fn test_configured_user_agent_is_sent() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "FolioTest/1.0"))
        .respond_with(html_page(document("Root", "")))
        .expect(1)
        .mount(&site)
        .await;

    let mut config = create_test_config(&base);
    config.fetcher.user_agents = vec!["FolioTest/1.0".to_string()];

    let mut coordinator = Coordinator::new(config).expect("create");
    let report = coordinator.run().await.expect("Crawl failed");

    assert_eq!(report.pages_failed, 0);
}

#[tokio::test]
async fn test_cancel_before_run() {
    let site = MockServer::start().await;
    mount_page(&site, "/", document("Root", ""), 0).await;

    let mut coordinator = Coordinator::new(create_test_config(&site.uri())).expect("create");
    coordinator.cancel_handle().cancel();

    let report = coordinator.run().await.expect("Crawl failed");
    assert_eq!(report.state, CrawlState::Stopped);
    assert!(coordinator.storage().is_empty());
}

#[tokio::test]
async fn test_cancel_during_crawl_keeps_collected_pages() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(
        &site,
        "/",
        document("Root", r#"<a href="/x">x</a><a href="/y">y</a>"#),
        1,
    )
    .await;
    mount_page(&site, "/x", document("X", ""), 0).await;
    mount_page(&site, "/y", document("Y", ""), 0).await;

    let mut config = create_test_config(&base);
    // Long enough that the children are still waiting when the stop lands
    config.crawler.per_domain_delay = 2_000;

    let mut coordinator = Coordinator::new(config).expect("create");
    let cancel = coordinator.cancel_handle();
    let mut events = coordinator.subscribe();
    let root = coordinator.start_url().to_string();

    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let CrawlEvent::PageCompleted { url, .. } = event {
                if url == root {
                    cancel.cancel();
                    break;
                }
            }
        }
    });

    let report = tokio::time::timeout(Duration::from_secs(10), coordinator.run())
        .await
        .expect("crawl did not stop")
        .expect("Crawl failed");

    assert_eq!(report.state, CrawlState::Stopped);

    let storage = coordinator.storage();
    let root_page = storage.get(coordinator.start_url().as_str()).unwrap();
    assert_eq!(root_page.title, "Root");
    assert!(!root_page.is_placeholder());
}

#[tokio::test]
async fn test_events_report_progress_and_state() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_page(&site, "/", document("Root", r#"<a href="/x">x</a>"#), 1).await;
    mount_page(&site, "/x", document("X", ""), 1).await;

    let mut coordinator = Coordinator::new(create_test_config(&base)).expect("create");
    let mut events = coordinator.subscribe();
    coordinator.run().await.expect("Crawl failed");

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(matches!(
        received.first(),
        Some(CrawlEvent::StateChanged {
            from: CrawlState::Idle,
            to: CrawlState::Running
        })
    ));
    assert!(matches!(
        received.last(),
        Some(CrawlEvent::StateChanged {
            from: CrawlState::Running,
            to: CrawlState::Completed
        })
    ));

    let mut progress: Vec<usize> = received
        .iter()
        .filter_map(|event| match event {
            CrawlEvent::Progress { processed, .. } => Some(*processed),
            _ => None,
        })
        .collect();
    progress.sort_unstable();
    assert_eq!(progress, vec![1, 2]);

    let started = received
        .iter()
        .filter(|event| matches!(event, CrawlEvent::PageStarted { .. }))
        .count();
    assert_eq!(started, 2);
}

#[tokio::test]
async fn test_invalid_start_url_never_starts() {
    let config = create_test_config("ftp://example.com/");
    assert!(Coordinator::new(config).is_err());
}
