//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small documentation site and run
//! the full crawl, extract and assemble cycle end-to-end.

use mambu_docs::config::{parse_config, Config};
use mambu_docs::model::{HttpMethod, ParameterLocation};
use mambu_docs::output::{parse_structured, render_artifacts};
use mambu_docs::{run_crawl, RunState};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `/api/v2` on the mock server
fn create_test_config(base_url: &str, max_pages: u32) -> Config {
    let toml = format!(
        r#"
[crawler]
api-version = "v2"
start-urls = ["{base}/api/v2"]
version-filter = "/api/v2"
max-pages = {max_pages}
inter-page-delay = 0
fetch-timeout = 5000

[crawler.retry]
max-attempts = 1

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
directory = "./test_output"
"#,
        base = base_url,
        max_pages = max_pages
    );
    parse_config(&toml).expect("test config should be valid")
}

async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(server)
        .await;
}

const OVERVIEW: &str = r#"<html><head><title>Mambu API v2</title></head><body><main>
<h1>Overview</h1>
<p>Welcome to the Mambu API.</p>
<a href="/api/v2/loans">Loans</a>
<a href="/api/v2/health">Health</a>
<a href="/api/v1/clients">Old version</a>
<a href="https://elsewhere.example/api/v2/loans">Mirror</a>
</main></body></html>"#;

const CREATE_LOAN: &str = r#"<html><body><main>
<h1>Loans</h1>
<h2>Create loan</h2>
<p>POST /loans</p>
<p>Creates a loan account.</p>
<pre class="highlight tab-shell"><code>curl -X POST /loans</code></pre>
<h3>Parameters</h3>
<table>
  <tr><th>Name</th><th>In</th><th>Type</th><th>Required</th><th>Description</th></tr>
  <tr><td>body</td><td>body</td><td>LoanAccount</td><td>true</td><td>Loan to create</td></tr>
</table>
<a href="/api/v2">Back</a>
</main></body></html>"#;

const HEALTH: &str = r#"<html><body><main>
<h1>Monitoring</h1>
<h2>Get health</h2>
<pre>GET /health</pre>
<p>Liveness check.</p>
<a href="/api/v2/loans">Loans</a>
</main></body></html>"#;

#[tokio::test]
async fn test_full_crawl_builds_document() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/api/v2", OVERVIEW).await;
    mount_page(&mock_server, "/api/v2/loans", CREATE_LOAN).await;
    mount_page(&mock_server, "/api/v2/health", HEALTH).await;

    let config = create_test_config(&mock_server.uri(), 50);
    let outcome = run_crawl(&config, CancellationToken::new())
        .await
        .expect("crawl should complete");

    assert_eq!(outcome.summary.run_state, RunState::Completed);
    assert_eq!(outcome.summary.fetched, 3);
    assert_eq!(outcome.summary.fetch_failed, 0);
    assert!(!outcome.summary.truncated);

    let document = &outcome.document;
    assert_eq!(document.version, "v2");
    let titles: Vec<&str> = document.pages.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Overview", "Create loan", "Get health"]);
    assert_eq!(document.endpoint_count(), 2);

    let loan = document.pages[1].endpoint.as_ref().unwrap();
    assert_eq!(loan.http_method, HttpMethod::Post);
    assert_eq!(loan.path, "/loans");
    assert_eq!(loan.parameters.len(), 1);
    assert_eq!(loan.parameters[0].location, ParameterLocation::Body);
    assert!(loan.code_samples.contains_key("curl"));
    assert_eq!(document.pages[1].section_path, vec!["Loans".to_string()]);

    let health = document.pages[2].endpoint.as_ref().unwrap();
    assert_eq!(health.path, "/health");
    assert!(health.parameters.is_empty());
    assert_eq!(document.pages[2].section_path, vec!["Monitoring".to_string()]);
}

#[tokio::test]
async fn test_crawl_output_renders_both_artifacts() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/api/v2", OVERVIEW).await;
    mount_page(&mock_server, "/api/v2/loans", CREATE_LOAN).await;
    mount_page(&mock_server, "/api/v2/health", HEALTH).await;

    let config = create_test_config(&mock_server.uri(), 50);
    let outcome = run_crawl(&config, CancellationToken::new()).await.unwrap();
    let artifacts = render_artifacts(&outcome.document, "mambu_api_").unwrap();

    assert!(artifacts.structured.name.starts_with("mambu_api_v2_"));
    assert!(artifacts.structured.name.ends_with(".json"));
    assert_eq!(
        artifacts.narrative.name.trim_end_matches(".md"),
        artifacts.structured.name.trim_end_matches(".json")
    );

    let parsed = parse_structured(&artifacts.structured.bytes).unwrap();
    assert_eq!(parsed, outcome.document);

    let narrative = String::from_utf8(artifacts.narrative.bytes.clone()).unwrap();
    assert!(narrative.contains("`POST /loans`"));
    assert!(narrative.contains("`GET /health`"));
    assert!(narrative.contains("Table of Contents"));
}

#[tokio::test]
async fn test_cycles_fetch_each_page_once() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/api/v2",
        r#"<main><h1>Home</h1><p>Home.</p><a href="/api/v2/a">A</a><a href="/api/v2/b">B</a></main>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/api/v2/a",
        r#"<main><h1>A</h1><p>A.</p><a href="/api/v2/b">B</a><a href="/api/v2#intro">Home</a></main>"#,
    )
    .await;
    mount_page(
        &mock_server,
        "/api/v2/b",
        r#"<main><h1>B</h1><p>B.</p><a href="/api/v2/a">A</a><a href="/api/v2/">Home</a></main>"#,
    )
    .await;

    let config = create_test_config(&mock_server.uri(), 50);
    let outcome = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.document.pages.len(), 3);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_max_pages_limits_fetches() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<main><h1>Page</h1><p>Text.</p>
               <a href="/api/v2/one">1</a><a href="/api/v2/two">2</a><a href="/api/v2/three">3</a></main>"#,
        ))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2);
    let outcome = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
    assert!(outcome.summary.truncated);
}

#[tokio::test]
async fn test_missing_page_is_recorded_not_fatal() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/api/v2",
        r#"<main><h1>Home</h1><p>Home.</p><a href="/api/v2/gone">Gone</a></main>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 50);
    let outcome = run_crawl(&config, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.document.pages.len(), 1);
    assert_eq!(outcome.summary.fetch_failed, 1);
    assert!(outcome.summary.failures[0].url.ends_with("/api/v2/gone"));
}
