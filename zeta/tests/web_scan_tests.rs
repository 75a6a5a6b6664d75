//! Browser-driven web scan with the page renderer stubbed out.

mod common;

use std::sync::Arc;

use common::fixtures::load_fixture;
use zeta::discovery::web_scan::extract_subdomains;
use zeta::discovery::{PageRenderer, WebScanExtractor};
use zeta::report::{ReportNode, NOT_DETECTED};
use zeta::{ScanError, SubdomainSource};

const TITLE: &str = "📂 Subdomainfinder.c99.nl";

enum StubRenderer {
    Page(String),
    Fails,
    Panics,
}

impl PageRenderer for StubRenderer {
    fn render(&self, _domain: &str) -> Result<String, ScanError> {
        match self {
            StubRenderer::Page(html) => Ok(html.clone()),
            StubRenderer::Fails => Err(ScanError::Browser("Element not found: #scan_subdomains".to_string())),
            StubRenderer::Panics => panic!("renderer crashed"),
        }
    }
}

fn extractor(renderer: StubRenderer) -> WebScanExtractor {
    WebScanExtractor::with_renderer(Arc::new(renderer))
}

#[test]
fn test_fixture_drops_rows_without_ip() {
    let records = extract_subdomains(&load_fixture("c99_results.html")).expect("fixture should parse");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "www.example.com");
    assert_eq!(records[0].get("IP Address"), Some("93.184.215.14"));
    assert_eq!(records[0].get("Cloudflared"), Some("false"));
    assert_eq!(records[1].name, "shop.example.com");
    assert_eq!(records[1].get("Cloudflared"), Some("true"));
}

#[tokio::test]
async fn test_scan_rendered_page() {
    let source = extractor(StubRenderer::Page(load_fixture("c99_results.html")));

    let outcome = source.scan("example.com", TITLE).await;

    assert_eq!(outcome.subdomains, vec!["www.example.com", "shop.example.com"]);
    assert_eq!(outcome.tree.title, TITLE);
    assert_eq!(outcome.tree.nodes.len(), 2);
    assert_eq!(
        outcome.tree.nodes[1].leaves(),
        vec!["IP Address: 104.16.1.1", "Cloudflared: true"]
    );
}

#[tokio::test]
async fn test_navigation_table_before_results_is_ignored() {
    let page = load_fixture("c99_results.html").replacen(
        "<div class=\"container\">",
        "<div class=\"container\"><table class=\"menu\"><tr>\
         <td><a href=\"/\">Home</a></td><td><a href=\"/tools\">Tools</a></td>\
         <td><a href=\"/api\">API</a></td><td><a href=\"/about\">About</a></td></tr></table>",
        1,
    );
    let source = extractor(StubRenderer::Page(page));

    let outcome = source.scan("example.com", TITLE).await;

    assert_eq!(outcome.subdomains, vec!["www.example.com", "shop.example.com"]);
}

#[tokio::test]
async fn test_configured_results_container_is_searched_first() {
    let page = "<html><body>\
        <div class=\"well\"><table><tr><td>1</td><td><a>stale.example.com</a></td>\
        <td><a>192.0.2.1</a></td><td><img data-cf=\"false\"></td></tr></table></div>\
        <div id=\"results\"><table><tr><td>1</td><td><a>fresh.example.com</a></td>\
        <td><a>192.0.2.2</a></td><td><img data-cf=\"true\"></td></tr></table></div>\
        </body></html>";
    let source = extractor(StubRenderer::Page(page.to_string())).with_results_selector("#results");

    let outcome = source.scan("example.com", TITLE).await;

    assert_eq!(outcome.subdomains, vec!["fresh.example.com"]);
}

#[tokio::test]
async fn test_page_without_results_table() {
    let source = extractor(StubRenderer::Page(
        "<html><body><div class=\"well\">No subdomains found.</div></body></html>".to_string(),
    ));

    let outcome = source.scan("example.com", TITLE).await;

    assert!(outcome.subdomains.is_empty());
    assert_eq!(outcome.tree.nodes, vec![ReportNode::Notice(NOT_DETECTED.to_string())]);
}

#[tokio::test]
async fn test_render_failure_yields_empty_list() {
    let source = extractor(StubRenderer::Fails);

    let outcome = source.scan("example.com", TITLE).await;

    assert!(outcome.subdomains.is_empty());
    assert!(outcome.tree.is_failed());
    assert_eq!(outcome.tree.nodes.len(), 1);
    assert!(outcome.tree.nodes[0].label().contains("#scan_subdomains"));
}

#[tokio::test]
async fn test_renderer_panic_is_contained() {
    let source = extractor(StubRenderer::Panics);

    let outcome = source.scan("example.com", TITLE).await;

    assert!(outcome.subdomains.is_empty());
    assert!(outcome.tree.is_failed());
}

#[tokio::test]
async fn test_trait_object_dispatch() {
    let source: Box<dyn SubdomainSource> = Box::new(extractor(StubRenderer::Page(load_fixture("c99_results.html"))));

    assert_eq!(source.label(), "Subdomainfinder.c99.nl");
    let outcome = source.scan("example.com", TITLE).await;
    assert_eq!(outcome.subdomains.len(), 2);
}
