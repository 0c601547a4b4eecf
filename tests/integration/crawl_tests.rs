//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drain queues
//! through the real HTTP transport end-to-end.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_tide::config::{parse_config, CrawlerConfig, UserAgentConfig};
use sumi_tide::crawler::{CallbackHooks, CrawlOptions, Crawler, DrainReport, FetchError};
use sumi_tide::target::{FetchTarget, HeaderSet, RequestParams};
use sumi_tide::transport::HttpTransport;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Clone)]
struct Page {
    target: String,
    status: Option<u16>,
    title: Option<String>,
    body: Vec<u8>,
}

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn test_transport() -> Arc<HttpTransport> {
    let crawler = CrawlerConfig {
        request_timeout_secs: 5,
        connect_timeout_secs: 2,
        ..Default::default()
    };
    Arc::new(HttpTransport::from_config(&test_user_agent(), &crawler).expect("Failed to build client"))
}

/// Builds hooks that record every completed page
fn recording_hooks() -> (CallbackHooks, Arc<Mutex<Vec<Page>>>) {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&pages);
    let hooks = CallbackHooks::new().on_complete(move |ctx| {
        sink.lock().unwrap().push(Page {
            target: ctx.target.to_string(),
            status: ctx.response.map(|r| r.status),
            title: ctx.document.title(),
            body: ctx.body.to_vec(),
        });
    });
    (hooks, pages)
}

async fn drain(crawler: &Crawler) -> DrainReport {
    tokio::time::timeout(Duration::from_secs(10), crawler.run().end())
        .await
        .expect("Drain did not complete in time")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_drain_three_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/", "<html><head><title>Home</title></head></html>").await;
    mount_page(&mock_server, "/page1", "<html><head><title>Page 1</title></head></html>").await;
    mount_page(&mock_server, "/page2", "<html><head><title>Page 2</title></head></html>").await;

    let (hooks, pages) = recording_hooks();
    let options = CrawlOptions {
        queue: vec![
            FetchTarget::from(format!("{}/", base_url)),
            FetchTarget::from(format!("{}/page1", base_url)),
            FetchTarget::from(format!("{}/page2", base_url)),
        ],
        hooks: Arc::new(hooks),
        ..Default::default()
    };
    let crawler = Crawler::new(options, test_transport());

    let report = drain(&crawler).await;

    assert_eq!(report.dispatched, 3);
    assert_eq!(report.completed, 3);
    assert!(report.is_clean(), "unexpected errors: {:?}", report.errors);
    assert_eq!(crawler.in_flight(), 0);

    let mut titles: Vec<String> = pages
        .lock()
        .unwrap()
        .iter()
        .filter_map(|p| p.title.clone())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);
}

#[tokio::test]
async fn test_fixed_headers_reach_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/secret"))
        .and(header("x-api-key", "fixed"))
        .and(header("x-extra", "kept"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>granted</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let address = url::Url::parse(&mock_server.uri()).expect("Failed to parse base URL");
    let mut params = RequestParams::new(
        "http",
        address.host_str().expect("Failed to extract host"),
        "/secret",
    );
    params.port = address.port();
    params.set_header("X-Api-Key", "per-target");
    params.set_header("X-Extra", "kept");

    let mut fixed = HeaderSet::new();
    fixed.insert("x-api-key".to_string(), "fixed".to_string());

    let (hooks, pages) = recording_hooks();
    let options = CrawlOptions {
        queue: vec![FetchTarget::Params(params)],
        headers: Some(fixed),
        hooks: Arc::new(hooks),
        ..Default::default()
    };
    let crawler = Crawler::new(options, test_transport());

    let report = drain(&crawler).await;

    assert_eq!(report.completed, 1);
    let pages = pages.lock().unwrap();
    assert_eq!(pages[0].status, Some(200));
    assert_eq!(pages[0].body, b"<p>granted</p>".to_vec());
}

#[tokio::test]
async fn test_error_status_still_completes() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<title>Not Found</title>"))
        .mount(&mock_server)
        .await;

    let (hooks, pages) = recording_hooks();
    let options = CrawlOptions {
        queue: vec![FetchTarget::from(format!("{}/missing", base_url))],
        hooks: Arc::new(hooks),
        ..Default::default()
    };
    let crawler = Crawler::new(options, test_transport());

    let report = drain(&crawler).await;

    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 0);
    let pages = pages.lock().unwrap();
    assert_eq!(pages[0].status, Some(404));
    assert_eq!(pages[0].title.as_deref(), Some("Not Found"));
}

#[tokio::test]
async fn test_empty_body_yields_empty_buffer() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let (hooks, pages) = recording_hooks();
    let options = CrawlOptions {
        queue: vec![FetchTarget::from(format!("{}/empty", base_url))],
        hooks: Arc::new(hooks),
        ..Default::default()
    };
    let crawler = Crawler::new(options, test_transport());

    let report = drain(&crawler).await;

    assert_eq!(report.completed, 1);
    let pages = pages.lock().unwrap();
    assert_eq!(pages[0].status, Some(204));
    assert!(pages[0].body.is_empty());
    assert_eq!(pages[0].title, None);
}

#[tokio::test]
async fn test_connection_refused_is_reported() {
    // Reserve a port, then free it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let port = listener.local_addr().expect("No local address").port();
    drop(listener);

    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", "<title>Up</title>").await;

    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&errors);
    let hooks = CallbackHooks::new().on_error(move |ctx| {
        sink.lock().unwrap().push(ctx.error.clone());
    });

    let refused = format!("http://127.0.0.1:{}/", port);
    let options = CrawlOptions {
        queue: vec![
            FetchTarget::from(refused.clone()),
            FetchTarget::from(format!("{}/", mock_server.uri())),
        ],
        hooks: Arc::new(hooks),
        ..Default::default()
    };
    let crawler = Crawler::new(options, test_transport());

    let report = drain(&crawler).await;

    assert_eq!(report.dispatched, 2);
    assert_eq!(report.completed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(crawler.in_flight(), 0);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], FetchError::Transport { .. }));
    assert_eq!(errors[0].target(), refused);
    assert_eq!(report.errors, *errors);
}

#[tokio::test]
async fn test_drain_from_config() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    for i in 0..5 {
        mount_page(
            &mock_server,
            &format!("/item/{}", i),
            &format!("<title>Item {}</title>", i),
        )
        .await;
    }

    let queue: Vec<String> = (0..5)
        .map(|i| format!("\"{}/item/{}\"", base_url, i))
        .collect();
    let config = parse_config(&format!(
        r#"
queue = [{}]

[crawler]
max-concurrent = 2
request-timeout-secs = 5

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[headers]
Accept = "text/html"
"#,
        queue.join(", ")
    ))
    .expect("Failed to parse config");

    let (hooks, pages) = recording_hooks();
    let options = CrawlOptions {
        queue: config.targets(),
        headers: config.headers.clone(),
        hooks: Arc::new(hooks),
        max_concurrency: config.crawler.max_concurrent.map(|n| n as usize),
    };
    let transport = Arc::new(
        HttpTransport::from_config(&config.user_agent, &config.crawler)
            .expect("Failed to build client"),
    );
    let crawler = Crawler::new(options, transport);

    let report = drain(&crawler).await;

    assert_eq!(report.completed, 5);
    let pages = pages.lock().unwrap();
    assert_eq!(pages.len(), 5);
    for i in 0..5 {
        let target = format!("{}/item/{}", base_url, i);
        let page = pages
            .iter()
            .find(|p| p.target == target)
            .expect("Missing page");
        assert_eq!(page.title, Some(format!("Item {}", i)));
    }
}
