//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run complete
//! harvests end-to-end into a temporary output directory.

use leafcutter::config::Config;
use leafcutter::crawler::{run_crawl, CrawlOptions};
use leafcutter::storage::FsStorage;
use leafcutter::CrawlSummary;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates run options with a small worker pool
fn create_test_options(crawl_enabled: bool, max_depth: u32, same_domain: bool) -> CrawlOptions {
    let mut options = CrawlOptions::from_config(&Config::default(), crawl_enabled);
    options.max_depth = max_depth;
    options.same_domain = same_domain;
    options.workers = 4;
    options.http.request_timeout_secs = 5;
    options
}

/// An HTML page whose content region holds `content`; the navigation link
/// outside of it must never be followed
fn html_page(title: &str, content: &str) -> ResponseTemplate {
    let html = format!(
        r#"<html>
            <head><title>{}</title></head>
            <body>
                <nav><a href="/navigation-only">Menu</a></nav>
                <main>{}</main>
                <footer><a href="/footer-only">Footer</a></footer>
            </body>
        </html>"#,
        title, content
    );
    ResponseTemplate::new(200).set_body_raw(html, "text/html")
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

/// Furniture links that must never be fetched
async fn mount_furniture(server: &MockServer) {
    mount(server, "/navigation-only", html_page("Nav", "nav"), 0).await;
    mount(server, "/footer-only", html_page("Footer", "footer"), 0).await;
}

async fn harvest(seeds: &[String], options: CrawlOptions, output: &Path) -> CrawlSummary {
    let seeds: Vec<Url> = seeds.iter().map(|s| Url::parse(s).unwrap()).collect();
    run_crawl(&seeds, options, Arc::new(FsStorage::new(output)))
        .await
        .expect("crawl should start")
}

/// Names of all files written below `root`, sorted
fn saved_files(root: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(domains) = std::fs::read_dir(root) else {
        return names;
    };
    for domain in domains {
        let domain = domain.unwrap().path();
        for file in std::fs::read_dir(&domain).unwrap() {
            names.push(file.unwrap().file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    names
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_page_without_crawl_still_downloads_documents() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_furniture(&server).await;

    mount(
        &server,
        "/start",
        html_page(
            "Start",
            r#"<p>Intro</p>
               <a href="/child">Child page</a>
               <a href="/files/report.pdf">Report</a>"#,
        ),
        1,
    )
    .await;
    mount(&server, "/child", html_page("Child", "child"), 0).await;
    mount(
        &server,
        "/files/report.pdf",
        ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        1,
    )
    .await;

    let output = TempDir::new().unwrap();
    let summary = harvest(
        &[format!("{}/start", base)],
        create_test_options(false, 1, false),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 1);
    assert_eq!(summary.page_failures, 0);
    assert_eq!(summary.documents_saved, 1);
    assert_eq!(summary.pages_per_depth.get(&1), None);
    assert_eq!(saved_files(output.path()), vec!["report.pdf", "start.md"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crawl_depth_one_same_domain() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_furniture(&server).await;

    mount(
        &server,
        "/start",
        html_page(
            "Start",
            r#"<a href="/a">A</a>
               <a href="/b">B</a>
               <a href="https://elsewhere.example/x">Elsewhere</a>"#,
        ),
        1,
    )
    .await;
    mount(&server, "/a", html_page("A", r#"<a href="/deep">Deep</a>"#), 1).await;
    mount(&server, "/b", html_page("B", r#"<a href="/start">Back</a>"#), 1).await;
    mount(&server, "/deep", html_page("Deep", "too deep"), 0).await;

    let output = TempDir::new().unwrap();
    let summary = harvest(
        &[format!("{}/start", base)],
        create_test_options(true, 1, true),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 3);
    assert_eq!(summary.pages_per_depth.get(&0), Some(&1));
    assert_eq!(summary.pages_per_depth.get(&1), Some(&2));
    assert_eq!(summary.pages_per_depth.get(&2), None);
    assert_eq!(saved_files(output.path()), vec!["a.md", "b.md", "start.md"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_link_processed_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_furniture(&server).await;

    mount(&server, "/s1", html_page("S1", r#"<a href="/common">Common</a>"#), 1).await;
    mount(&server, "/s2", html_page("S2", r#"<a href="/common?utm_source=s2">Common</a>"#), 1).await;
    mount(&server, "/common", html_page("Common", "shared"), 1).await;

    let output = TempDir::new().unwrap();
    let summary = harvest(
        &[format!("{}/s1", base), format!("{}/s2", base)],
        create_test_options(true, 1, false),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 3);
    assert_eq!(summary.pages_per_depth.get(&1), Some(&1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transport_error_counts_as_failure() {
    let output = TempDir::new().unwrap();

    // Nothing listens on port 1
    let summary = harvest(
        &["http://127.0.0.1:1/unreachable".to_string()],
        create_test_options(false, 1, false),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 0);
    assert_eq!(summary.page_failures, 1);
    assert!(saved_files(output.path()).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_child_does_not_stop_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_furniture(&server).await;

    mount(
        &server,
        "/start",
        html_page("Start", r#"<a href="/missing">Missing</a><a href="/ok">Ok</a>"#),
        1,
    )
    .await;
    mount(&server, "/missing", ResponseTemplate::new(404), 1).await;
    mount(&server, "/ok", html_page("Ok", "fine"), 1).await;

    let output = TempDir::new().unwrap();
    let summary = harvest(
        &[format!("{}/start", base)],
        create_test_options(true, 1, false),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 2);
    assert_eq!(summary.page_failures, 1);
    assert_eq!(saved_files(output.path()), vec!["ok.md", "start.md"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_document_downloaded_once_across_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_furniture(&server).await;

    let links = r#"<a href="/media/annual.pdf">Annual report</a>"#;
    mount(&server, "/p1", html_page("P1", links), 1).await;
    mount(&server, "/p2", html_page("P2", links), 1).await;
    mount(&server, "/p3", html_page("P3", links), 1).await;
    mount(
        &server,
        "/media/annual.pdf",
        ResponseTemplate::new(200).set_body_raw(b"%PDF".to_vec(), "application/pdf"),
        1,
    )
    .await;

    let output = TempDir::new().unwrap();
    let summary = harvest(
        &[
            format!("{}/p1", base),
            format!("{}/p2", base),
            format!("{}/p3", base),
        ],
        create_test_options(false, 1, false),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 3);
    assert_eq!(summary.documents_saved, 1);
    assert_eq!(summary.document_failures, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_page_beyond_max_depth() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_furniture(&server).await;

    mount(&server, "/l0", html_page("L0", r#"<a href="/l1">next</a>"#), 1).await;
    mount(&server, "/l1", html_page("L1", r#"<a href="/l2">next</a><a href="/l0">up</a>"#), 1).await;
    mount(&server, "/l2", html_page("L2", r#"<a href="/l3">next</a>"#), 1).await;
    mount(&server, "/l3", html_page("L3", "end"), 0).await;

    let output = TempDir::new().unwrap();
    let summary = harvest(
        &[format!("{}/l0", base)],
        create_test_options(true, 2, true),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 3);
    let depths: Vec<u32> = summary.pages_per_depth.keys().copied().collect();
    assert_eq!(depths, vec![0, 1, 2]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_saved_markdown_content() {
    let server = MockServer::start().await;
    let base = server.uri();

    let html = r#"<html>
        <head><title>Tax rates - GOV.UK</title></head>
        <body>
            <p class="gem-c-lead-paragraph">Rates for the current year.</p>
            <div class="gem-c-metadata"><dl>
                <dt>From:</dt><dd>HM Revenue &amp; Customs</dd>
                <dt>Published</dt><dd>6 April 2024</dd>
            </dl></div>
            <main id="content"><div class="govuk-govspeak">
                <h2>Income tax</h2>
                <p>The basic rate is 20%.</p>
                <section class="gem-c-attachment">
                    <a class="gem-c-attachment__link" href="/media/rates">Rates table</a>
                </section>
            </div></main>
        </body>
    </html>"#;
    mount(
        &server,
        "/guidance/tax-rates",
        ResponseTemplate::new(200).set_body_raw(html, "text/html"),
        1,
    )
    .await;
    mount(
        &server,
        "/media/rates",
        ResponseTemplate::new(200)
            .set_body_raw(b"a,b\n1,2\n".to_vec(), "text/csv")
            .insert_header("content-disposition", "attachment; filename=\"rates.csv\""),
        1,
    )
    .await;

    let output = TempDir::new().unwrap();
    let seed = format!("{}/guidance/tax-rates", base);
    let summary = harvest(&[seed.clone()], create_test_options(false, 1, false), output.path()).await;

    assert_eq!(summary.pages_saved, 1);
    assert_eq!(summary.documents_saved, 1);
    assert_eq!(
        saved_files(output.path()),
        vec!["2024-04-06_tax-rates.md", "rates.csv"]
    );

    let domain_dir = std::fs::read_dir(output.path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    let markdown = std::fs::read_to_string(domain_dir.join("2024-04-06_tax-rates.md")).unwrap();
    assert!(markdown.starts_with(&format!("Source: {}\n\n# Tax rates - GOV.UK\n\n", seed)));
    assert!(markdown.contains("Rates for the current year."));
    assert!(markdown.contains("From:\nHM Revenue & Customs\n"));
    assert!(markdown.contains("Published:\n6 April 2024\n"));
    assert!(markdown.contains("The basic rate is 20%."));
    assert!(markdown.contains(&format!("- [Rates table]({}/media/rates)", base)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_whole_body_fallback_is_counted() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount(
        &server,
        "/plain",
        ResponseTemplate::new(200)
            .set_body_raw("<html><body><div><p>Just text</p></div></body></html>", "text/html"),
        1,
    )
    .await;

    let output = TempDir::new().unwrap();
    let summary = harvest(
        &[format!("{}/plain", base)],
        create_test_options(false, 1, false),
        output.path(),
    )
    .await;

    assert_eq!(summary.pages_saved, 1);
    assert_eq!(summary.degraded_pages, 1);
}
