// End-to-end runs of the crawl handler against a mock site

use outlink::handlers::{CrawlArgs, run_crawl};
use outlink_core::CoreError;
use outlink_core::report::ReportFormat;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(format!("<html><body>{}</body></html>", body))
}

fn args_for(server: &MockServer, dir: &Path) -> CrawlArgs {
    CrawlArgs {
        start_url: Url::parse(&format!("{}/", server.uri())).unwrap(),
        domain: "127.0.0.1".to_string(),
        page_limit: -1,
        concurrency: 4,
        attempts: 1,
        timeout: Duration::from_secs(2),
        show_dead_links: false,
        whitelist_file: dir.join("whitelist.txt"),
        dead_urls_file: dir.join("dead.txt"),
        interactive: false,
        format: ReportFormat::Json,
        output: None,
        quiet: true,
    }
}

#[tokio::test]
async fn test_run_crawl_reports_outbound_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/about">About</a>
               <a href="https://ext.test/a">Ext</a>
               <a href="https://www.trusted.test/">Trusted</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<a href="/">Home</a><a href="https://ext.test/a">Ext</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let args = args_for(&server, temp_dir.path());
    std::fs::write(&args.whitelist_file, "// trusted partners\ntrusted.test\n").unwrap();
    std::fs::write(&args.dead_urls_file, "").unwrap();

    let (report, whitelist) = run_crawl(&args).await.unwrap();

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.whitelisted_links, 1);
    assert_eq!(report.outbound.len(), 1);
    assert_eq!(report.outbound[0].url.as_str(), "https://ext.test/a");
    assert_eq!(report.outbound[0].domain, "ext.test");
    assert_eq!(report.outbound[0].referrers.len(), 2);
    assert!(report.dead_links.is_none());
    assert!(whitelist.contains_host("trusted.test"));
}

#[tokio::test]
async fn test_run_crawl_requires_dead_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let args = args_for(&server, temp_dir.path());

    let err = run_crawl(&args).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::MissingDeadList(_))
    ));
}

#[tokio::test]
async fn test_run_crawl_reports_dead_links() {
    let server = MockServer::start().await;
    let port = server.address().port();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&format!(
            r#"<a href="http://localhost:{port}/gone">Gone</a>
               <a href="http://localhost:{port}/blocked">Blocked</a>"#
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(403))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let mut args = args_for(&server, temp_dir.path());
    args.show_dead_links = true;
    std::fs::write(
        &args.dead_urls_file,
        format!("http://localhost:{port}/blocked\n"),
    )
    .unwrap();

    let (report, _) = run_crawl(&args).await.unwrap();

    assert_eq!(report.outbound.len(), 2);
    let dead = report.dead_links.unwrap();
    assert_eq!(dead.len(), 1);
    assert!(dead[0].url.as_str().ends_with("/gone"));
}
