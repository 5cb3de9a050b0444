//! Crawl-to-document tests: anchors, link rewriting and written output

use crate::{create_test_config, document, html_page};
use sumi_folio::config::OutputFormat;
use sumi_folio::crawler::Coordinator;
use sumi_folio::output::{assemble, write_document, DocumentMeta, SectionBody};
use sumi_folio::storage::MemoryStorage;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Crawls `/a` -> `/b` on one server with a link to an uncollected host
async fn crawl_site(site: &MockServer, external: &str) -> MemoryStorage {
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page(document(
            "Page A",
            &format!(
                r#"<p>See <a href="b">page B</a> or <a href="{}/elsewhere">outside</a>.</p>"#,
                external
            ),
        )))
        .mount(site)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page(document(
            "Page B",
            r#"<p>Back to <a href="/a#intro">A</a></p><script>alert(1)</script>"#,
        )))
        .mount(site)
        .await;

    let mut config = create_test_config(&format!("{}/a", base));
    config.crawler.same_domain_only = true;

    let mut coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    coordinator.run().await.expect("Crawl failed");
    coordinator.storage()
}

#[tokio::test]
async fn test_links_between_pages_become_anchors() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let storage = crawl_site(&site, &other.uri()).await;

    let doc = assemble(&storage, DocumentMeta::new(format!("{}/a", site.uri()), 2));

    assert_eq!(doc.toc.len(), 2);
    assert_eq!(doc.toc[0].title, "Page A");
    assert_eq!(doc.toc[0].anchor, "page-1");
    assert_eq!(doc.toc[1].title, "Page B");

    match &doc.sections[0].body {
        SectionBody::Content { markup, text } => {
            assert!(markup.contains(r##"<a href="#page-2">page B</a>"##), "{}", markup);
            assert!(
                markup.contains(&format!(r#"href="{}/elsewhere""#, other.uri())),
                "{}",
                markup
            );
            assert!(text.contains("See page B"));
        }
        other => panic!("unexpected body: {:?}", other),
    }

    match &doc.sections[1].body {
        SectionBody::Content { markup, .. } => {
            assert!(markup.contains(r##"<a href="#page-1">A</a>"##), "{}", markup);
            assert!(!markup.contains("<script"));
        }
        other => panic!("unexpected body: {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_pages_appear_in_document() {
    let site = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(document("Root", r#"<a href="/gone">gone</a>"#)))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&site)
        .await;

    let mut coordinator = Coordinator::new(create_test_config(&base)).expect("create");
    coordinator.run().await.expect("Crawl failed");

    let doc = assemble(&coordinator.storage(), DocumentMeta::new(base.clone(), 2));

    assert_eq!(doc.summary.page_count, 2);
    assert_eq!(doc.summary.failed_count, 1);
    assert!(matches!(
        &doc.sections[1].body,
        SectionBody::FetchFailed { error } if error.contains("HTTP 503")
    ));
}

#[tokio::test]
async fn test_written_documents() {
    let site = MockServer::start().await;
    let other = MockServer::start().await;
    let storage = crawl_site(&site, &other.uri()).await;
    let doc = assemble(&storage, DocumentMeta::new(format!("{}/a", site.uri()), 2));

    let dir = tempfile::tempdir().unwrap();

    let mut config = create_test_config(&site.uri()).output;
    config.path = dir.path().join("site.html").to_string_lossy().into_owned();
    write_document(&doc, &config).expect("write html");
    let html = std::fs::read_to_string(&config.path).unwrap();
    assert!(html.contains(r#"<section id="page-2">"#));
    assert!(html.contains(r##"<a href="#page-2">page B</a>"##));

    config.path = dir.path().join("site.md").to_string_lossy().into_owned();
    assert_eq!(config.effective_format(), OutputFormat::Markdown);
    write_document(&doc, &config).expect("write markdown");
    let md = std::fs::read_to_string(&config.path).unwrap();
    assert!(md.contains("1. [Page A](#page-1) (Depth: 0)"));
    assert!(md.contains("[page B](#page-2)"));
}
