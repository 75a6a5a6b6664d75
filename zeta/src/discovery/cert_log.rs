//! Certificate Transparency (CT) log discovery.
//!
//! Queries crt.sh's HTML search page for a domain and turns each logged
//! certificate row into a [`SubdomainRecord`] keyed on the certificate's
//! identity.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::table::{self, ColumnMap, LayoutSource, PositionalLayout};
use super::{ScanError, ScanOutcome, SubdomainSource};
use crate::config::{CertLogConfig, HttpConfig};
use crate::record::{dedupe_records, SubdomainRecord};

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CertField {
    Id,
    LoggedAt,
    NotBefore,
    NotAfter,
    Identity,
    Issuer,
}

/// Header labels per field, most preferred first.
const HEADER_ALIASES: &[(CertField, &[&str])] = &[
    (CertField::Id, &["crt.sh ID", "ID"]),
    (CertField::LoggedAt, &["Logged At"]),
    (CertField::NotBefore, &["Not Before"]),
    (CertField::NotAfter, &["Not After"]),
    (CertField::Identity, &["Common Name", "Matching Identities"]),
    (CertField::Issuer, &["Issuer Name", "Issuer"]),
];

/// crt.sh results table as served without a usable header row.
const LAYOUT_V1: PositionalLayout<CertField> = PositionalLayout {
    version: "crt.sh/v1",
    width: 7,
    columns: &[
        (CertField::Id, 0),
        (CertField::LoggedAt, 1),
        (CertField::NotBefore, 2),
        (CertField::NotAfter, 3),
        (CertField::Identity, 4),
        (CertField::Issuer, 6),
    ],
};

/// Metadata labels in report order.
const METADATA_FIELDS: &[(CertField, &str)] = &[
    (CertField::Id, "ID"),
    (CertField::LoggedAt, "Logged At"),
    (CertField::NotBefore, "Not Before"),
    (CertField::NotAfter, "Not After"),
    (CertField::Issuer, "Issuer"),
];

pub struct CertLogExtractor {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl CertLogExtractor {
    pub fn new(config: &CertLogConfig, http: &HttpConfig) -> Self {
        Self::with_base_url(&config.base_url, &http.user_agent, http.request_timeout())
    }

    pub fn with_base_url(base_url: &str, user_agent: &str, timeout: Duration) -> Self {
        let client = build_client(user_agent, timeout).unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with user agent ({}), retrying without it", e);
            Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
                warn!(
                    "Failed to build HTTP client ({}), falling back to defaults without the {}s timeout",
                    e,
                    timeout.as_secs()
                );
                Client::new()
            })
        });

        Self {
            client,
            base_url: base_url.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// Fetch the search page for `domain`. Anything but 200 is an error.
    pub async fn fetch(&self, domain: &str) -> Result<String, ScanError> {
        debug!("Querying {} for {}", self.base_url, domain);

        let response = self
            .client
            .get(&self.base_url)
            .header(USER_AGENT, &self.user_agent)
            .query(&[("q", domain)])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ScanError::Status {
                site: self.site_name(),
                code: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }

    pub async fn scan(&self, domain: &str, title: &str) -> ScanOutcome {
        info!("Searching certificate transparency logs for {}", domain);

        let result = async {
            let html = self.fetch(domain).await?;
            extract_subdomains(&html)
        }
        .await;

        if let Ok(records) = &result {
            info!("Certificate logs returned {} unique subdomains for {}", records.len(), domain);
        }

        ScanOutcome::from_result(title, result)
    }

    fn site_name(&self) -> String {
        Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.base_url.clone())
    }
}

#[async_trait]
impl SubdomainSource for CertLogExtractor {
    fn label(&self) -> &str {
        "Crt.sh"
    }

    async fn scan(&self, domain: &str, title: &str) -> ScanOutcome {
        CertLogExtractor::scan(self, domain, title).await
    }
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).user_agent(user_agent).build()
}

/// Parse a crt.sh results page into records, one per distinct identity,
/// keeping the first certificate seen for each.
pub fn extract_subdomains(html: &str) -> Result<Vec<SubdomainRecord>, ScanError> {
    let document = Html::parse_document(html);

    let (results_table, columns) =
        match table::find_table_by_header(&document, HEADER_ALIASES, &[CertField::Identity]) {
            Some(found) => found,
            None => match positional_table(&document) {
                Some(t) => (t, ColumnMap::positional(&LAYOUT_V1)),
                None => {
                    debug!("No certificate table in page");
                    return Ok(Vec::new());
                }
            },
        };

    if let LayoutSource::Positional(version) = columns.source {
        debug!("No recognizable header, reading rows with layout {}", version);
    }

    let rows = table::data_rows(results_table);
    let mut records = Vec::new();
    let mut mismatched = 0;

    for cells in &rows {
        if !columns.accepts_width(cells.len()) {
            mismatched += 1;
            continue;
        }
        if let Some(record) = record_from_row(cells, &columns) {
            records.push(record);
        }
    }

    if !rows.is_empty() && mismatched == rows.len() {
        let layout = match columns.source {
            LayoutSource::Positional(version) => version,
            LayoutSource::Header => "header",
        };
        return Err(ScanError::Schema(format!(
            "{} certificate rows did not match layout {}",
            rows.len(),
            layout
        )));
    }

    debug!("Parsed {} certificate rows", records.len());
    Ok(dedupe_records(records))
}

/// `/html/body/table[2]//td/table`: where crt.sh nests its results.
fn positional_table(document: &Html) -> Option<ElementRef<'_>> {
    let body = document.select(&BODY_SELECTOR).next()?;
    let outer = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "table")
        .nth(1)?;
    table::nested_tables(outer).into_iter().next()
}

fn record_from_row(cells: &[ElementRef], columns: &ColumnMap<CertField>) -> Option<SubdomainRecord> {
    let identity_cell = cells.get(columns.index(CertField::Identity)?)?;
    // Several identities may share one cell separated by <br>; the first names the row.
    let identity = table::cell_segments(identity_cell).into_iter().next()?;

    if is_column_label(&identity) {
        return None;
    }

    let record = METADATA_FIELDS
        .iter()
        .fold(SubdomainRecord::new(identity), |record, (field, label)| {
            match columns.index(*field).and_then(|idx| cells.get(idx)) {
                Some(cell) => record.with(*label, table::cell_text(cell)),
                None => record,
            }
        });

    Some(record)
}

/// A header row echoed as data (e.g. an identity reading "LoggedAt").
fn is_column_label(value: &str) -> bool {
    let normalized = table::normalize_label(value);
    HEADER_ALIASES
        .iter()
        .flat_map(|(_, names)| names.iter())
        .any(|name| table::normalize_label(name) == normalized)
}
