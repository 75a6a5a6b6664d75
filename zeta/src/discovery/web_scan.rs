//! Subdomain discovery through subdomainfinder.c99.nl.
//!
//! The tool only renders results client-side, so the page is driven with a
//! headless browser: fill the domain field, start the scan, wait for the
//! results container, then scrape the rendered table.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};

use super::table::{self, ColumnMap, PositionalLayout};
use super::{ScanError, ScanOutcome, SubdomainSource};
use crate::browser_pool;
use crate::config::{BrowserConfig, WebScanConfig};
use crate::record::{dedupe_records, SubdomainRecord};

static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("table").unwrap());
static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IMG_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());

/// Container the tool renders its results into.
pub const DEFAULT_RESULTS_SELECTOR: &str = ".well";

/// Attribute prefix the tool uses to flag Cloudflare-proxied hosts.
const CF_ATTRIBUTE: &str = "data-cf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolField {
    Subdomain,
    Ip,
    Cloudflare,
}

const HEADER_ALIASES: &[(ToolField, &[&str])] = &[
    (ToolField::Subdomain, &["Subdomain", "Subdomains", "Host"]),
    (ToolField::Ip, &["IP", "IP Address"]),
    (ToolField::Cloudflare, &["Cloudflare", "Cloudflared", "CF"]),
];

/// Row number, subdomain, IP, Cloudflare icon.
const LAYOUT_V1: PositionalLayout<ToolField> = PositionalLayout {
    version: "c99/v1",
    width: 4,
    columns: &[
        (ToolField::Subdomain, 1),
        (ToolField::Ip, 2),
        (ToolField::Cloudflare, 3),
    ],
};

/// Produces the rendered results page for a domain. Implementations block.
pub trait PageRenderer: Send + Sync {
    fn render(&self, domain: &str) -> Result<String, ScanError>;
}

/// Drives the tool in headless Chrome.
pub struct ChromeRenderer {
    tool: WebScanConfig,
    browser: BrowserConfig,
}

impl ChromeRenderer {
    pub fn new(tool: &WebScanConfig, browser: &BrowserConfig) -> Self {
        Self {
            tool: tool.clone(),
            browser: browser.clone(),
        }
    }
}

fn browser_error(context: &str, e: impl std::fmt::Display) -> ScanError {
    ScanError::Browser(format!("{}: {}", context, e))
}

impl PageRenderer for ChromeRenderer {
    fn render(&self, domain: &str) -> Result<String, ScanError> {
        // Dropping the guard kills Chrome, whichever way this function exits.
        let guard = browser_pool::create_browser(&self.browser)
            .map_err(|e| ScanError::Browser(e.to_string()))?;

        let tab = guard
            .browser
            .new_tab()
            .map_err(|e| browser_error("Failed to create tab", e))?;
        tab.set_default_timeout(self.tool.wait_timeout());

        debug!("Navigating to {}", self.tool.url);
        tab.navigate_to(&self.tool.url)
            .map_err(|e| browser_error("Navigation failed", e))?;
        tab.wait_until_navigated()
            .map_err(|e| browser_error("Page load failed", e))?;

        let input = tab
            .wait_for_element(&self.tool.domain_input_selector)
            .map_err(|e| browser_error("Domain input not found", e))?;
        input
            .click()
            .map_err(|e| browser_error("Failed to focus domain input", e))?;
        input
            .type_into(domain)
            .map_err(|e| browser_error("Failed to type domain", e))?;

        tab.wait_for_element(&self.tool.scan_button_selector)
            .map_err(|e| browser_error("Scan button not found", e))?
            .click()
            .map_err(|e| browser_error("Failed to start scan", e))?;

        debug!("Waiting for {} on {}", self.tool.results_selector, self.tool.url);
        tab.wait_for_element_with_custom_timeout(&self.tool.results_selector, self.tool.wait_timeout())
            .map_err(|e| browser_error("Scan results did not appear", e))?;

        let html = tab
            .get_content()
            .map_err(|e| browser_error("Failed to get page content", e))?;
        debug!("Rendered results page: {} chars", html.len());

        Ok(html)
    }
}

pub struct WebScanExtractor {
    renderer: Arc<dyn PageRenderer>,
    results_selector: String,
}

impl WebScanExtractor {
    pub fn new(tool: &WebScanConfig, browser: &BrowserConfig) -> Self {
        Self::with_renderer(Arc::new(ChromeRenderer::new(tool, browser)))
            .with_results_selector(&tool.results_selector)
    }

    pub fn with_renderer(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            renderer,
            results_selector: DEFAULT_RESULTS_SELECTOR.to_string(),
        }
    }

    /// Container the results table is looked up in before the whole page.
    pub fn with_results_selector(mut self, selector: &str) -> Self {
        self.results_selector = selector.to_string();
        self
    }

    pub async fn scan(&self, domain: &str, title: &str) -> ScanOutcome {
        info!("Running web subdomain scan for {}", domain);

        let renderer = self.renderer.clone();
        let domain_owned = domain.to_string();

        // headless_chrome operations are blocking, run in a blocking thread
        let result = match tokio::task::spawn_blocking(move || renderer.render(&domain_owned)).await {
            Ok(Ok(html)) => extract_subdomains_within(&html, &self.results_selector),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(ScanError::Task(e.to_string())),
        };

        if let Ok(records) = &result {
            info!("Web scan returned {} subdomains for {}", records.len(), domain);
        }

        ScanOutcome::from_result(title, result)
    }
}

#[async_trait]
impl SubdomainSource for WebScanExtractor {
    fn label(&self) -> &str {
        "Subdomainfinder.c99.nl"
    }

    async fn scan(&self, domain: &str, title: &str) -> ScanOutcome {
        WebScanExtractor::scan(self, domain, title).await
    }
}

/// The three row-aligned sequences scraped from the results table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ResultColumns {
    pub subdomains: Vec<String>,
    pub ips: Vec<String>,
    pub cloudflare: Vec<String>,
}

/// Parse the rendered results page into records.
pub fn extract_subdomains(html: &str) -> Result<Vec<SubdomainRecord>, ScanError> {
    extract_subdomains_within(html, DEFAULT_RESULTS_SELECTOR)
}

/// Parse records, preferring a results table inside `results_selector`.
pub fn extract_subdomains_within(html: &str, results_selector: &str) -> Result<Vec<SubdomainRecord>, ScanError> {
    let columns = extract_columns_within(html, results_selector)?;
    Ok(combine_rows(columns))
}

pub fn extract_columns(html: &str) -> Result<ResultColumns, ScanError> {
    extract_columns_within(html, DEFAULT_RESULTS_SELECTOR)
}

/// Scrape subdomain, IP and Cloudflare-flag sequences from the results
/// table. Tables under `results_selector` are tried first, then the whole
/// page. A row only contributes to a sequence when it has the expected
/// element (link or flagged image) in that column.
pub fn extract_columns_within(html: &str, results_selector: &str) -> Result<ResultColumns, ScanError> {
    let container = Selector::parse(results_selector).map_err(|e| {
        ScanError::Schema(format!("invalid results selector '{}': {:?}", results_selector, e))
    })?;
    let document = Html::parse_document(html);

    let all_tables: Vec<ElementRef> = document.select(&TABLE_SELECTOR).collect();
    if all_tables.is_empty() {
        debug!("No results table in page");
        return Ok(ResultColumns::default());
    }

    let scoped = table::tables_within(&document, &container);
    debug!("{} tables on page, {} under {}", all_tables.len(), scoped.len(), results_selector);

    let (results_table, columns) = locate_results_table(&scoped)
        .or_else(|| locate_results_table(&all_tables))
        .ok_or_else(|| {
            ScanError::Schema(format!("no results table matched layout {}", LAYOUT_V1.version))
        })?;

    let mut parsed = ResultColumns::default();
    for cells in table::data_rows(results_table) {
        if !columns.accepts_width(cells.len()) {
            continue;
        }
        let cell = |field| columns.index(field).and_then(|idx| cells.get(idx));

        if let Some(name) = cell(ToolField::Subdomain).and_then(link_text) {
            parsed.subdomains.push(name);
        }
        if let Some(ip) = cell(ToolField::Ip).and_then(link_text) {
            parsed.ips.push(ip);
        }
        if let Some(flag) = cell(ToolField::Cloudflare).and_then(cloudflare_flag) {
            parsed.cloudflare.push(flag);
        }
    }

    debug!(
        "Parsed {} subdomains, {} IPs, {} Cloudflare flags",
        parsed.subdomains.len(),
        parsed.ips.len(),
        parsed.cloudflare.len()
    );
    Ok(parsed)
}

/// Zip the sequences by position. The result is bounded by the shortest
/// sequence; rows whose IP is "none" (any case) are dropped.
pub fn combine_rows(columns: ResultColumns) -> Vec<SubdomainRecord> {
    let records = columns
        .subdomains
        .into_iter()
        .zip(columns.ips)
        .zip(columns.cloudflare)
        .filter(|((_, ip), _)| !ip.eq_ignore_ascii_case("none"))
        .map(|((name, ip), cf)| {
            SubdomainRecord::new(name)
                .with("IP Address", ip)
                .with("Cloudflared", cf)
        })
        .collect();

    dedupe_records(records)
}

/// Header-keyed match first, then the first table with a `c99/v1` row
/// carrying a subdomain link and a flag icon.
fn locate_results_table<'a>(tables: &[ElementRef<'a>]) -> Option<(ElementRef<'a>, ColumnMap<ToolField>)> {
    let required = [ToolField::Subdomain, ToolField::Ip, ToolField::Cloudflare];
    if let Some(found) = table::find_header_table_among(tables.iter().copied(), HEADER_ALIASES, &required) {
        return Some(found);
    }

    let columns = ColumnMap::positional(&LAYOUT_V1);
    let found = tables.iter().copied().find(|t| holds_results(*t, &columns))?;
    Some((found, columns))
}

fn holds_results(results_table: ElementRef, columns: &ColumnMap<ToolField>) -> bool {
    table::data_rows(results_table).iter().any(|cells| {
        let cell = |field| columns.index(field).and_then(|idx| cells.get(idx));
        columns.accepts_width(cells.len())
            && cell(ToolField::Subdomain).and_then(link_text).is_some()
            && cell(ToolField::Cloudflare).and_then(cloudflare_flag).is_some()
    })
}

fn link_text(cell: &ElementRef) -> Option<String> {
    let link = cell.select(&LINK_SELECTOR).next()?;
    let text = table::cell_text(&link);
    (!text.is_empty()).then_some(text)
}

/// Value of the `data-cf` attribute on the cell's icon, or of the first
/// `data-cf*` attribute when the exact name is absent.
fn cloudflare_flag(cell: &ElementRef) -> Option<String> {
    let img = cell.select(&IMG_SELECTOR).next()?;
    let element = img.value();

    element.attr(CF_ATTRIBUTE).map(str::to_string).or_else(|| {
        element
            .attrs()
            .find(|(name, _)| name.starts_with(CF_ATTRIBUTE))
            .map(|(_, value)| value.to_string())
    })
}
