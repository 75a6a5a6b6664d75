//! Discovery sources for finding subdomains of a target domain.
//!
//! Every source returns a [`ScanOutcome`] and never an error: failures are
//! folded into the report tree so the remaining sources still run.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::record::{record_names, SubdomainRecord};
use crate::report::ReportTree;

pub mod cert_log;
pub mod table;
pub mod web_scan;

pub use cert_log::CertLogExtractor;
pub use web_scan::{ChromeRenderer, PageRenderer, WebScanExtractor};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to retrieve {site} page, status code: {code}")]
    Status { site: String, code: u16 },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected page layout: {0}")]
    Schema(String),

    #[error("Browser automation failed: {0}")]
    Browser(String),

    #[error("Browser task failed: {0}")]
    Task(String),
}

/// Subdomain list plus report tree, as returned by every source.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub subdomains: Vec<String>,
    pub tree: ReportTree,
}

impl ScanOutcome {
    /// Fold an extraction result into an outcome. On error the list is
    /// always empty and the tree holds only the error message.
    pub fn from_result(title: &str, result: Result<Vec<SubdomainRecord>, ScanError>) -> Self {
        match result {
            Ok(records) => Self {
                subdomains: record_names(&records),
                tree: ReportTree::from_records(title, &records),
            },
            Err(e) => {
                warn!("{} scan failed: {}", title, e);
                Self {
                    subdomains: Vec::new(),
                    tree: ReportTree::failed(title, e.to_string()),
                }
            }
        }
    }

    pub fn into_parts(self) -> (Vec<String>, ReportTree) {
        (self.subdomains, self.tree)
    }
}

/// A place subdomains can be discovered from.
#[async_trait]
pub trait SubdomainSource: Send + Sync {
    /// Short human-readable name, e.g. "Crt.sh"
    fn label(&self) -> &str;

    async fn scan(&self, domain: &str, title: &str) -> ScanOutcome;
}
